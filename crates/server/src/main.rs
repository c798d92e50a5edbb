use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy_quinnet::server::{
    EndpointAddrConfiguration, QuinnetServer, ServerEndpointConfiguration,
    ServerEndpointConfigurationDefaultables, certificate::CertificateRetrievalMode,
};
use bevy_replicon::prelude::*;
use bevy_replicon_quinnet::{ChannelsConfigurationExt, RepliconQuinnetPlugins};
use clap::Parser;
use shared::{
    CharacterMovement, Locomotion, PeerRole, Rotator, SprintCommandsExt, SprintComponent,
    SprintIntent, SprintPlugin, SprintReplicationExt, SprintStarted, SprintStopped, SprintTuning,
};
use std::net::{IpAddr, Ipv6Addr};
use std::sync::mpsc::{Receiver, channel};
use std::sync::{Arc, Mutex};

#[derive(Resource, Parser)]
struct Args {
    #[arg(short, long, default_value_t = Ipv6Addr::LOCALHOST.into())]
    ip: IpAddr,
    #[arg(short, long, default_value_t = 5000)]
    port: u16,
    /// Max walk speed while sprinting
    #[arg(long, default_value_t = 1000.0)]
    sprint_speed: f32,
    /// Yaw rate in degrees per second while sprinting
    #[arg(long, default_value_t = 50.0)]
    sprint_turn_rate: f32,
}

impl Args {
    fn tuning(&self) -> SprintTuning {
        SprintTuning(Locomotion::new(
            self.sprint_speed,
            Rotator::from_yaw(self.sprint_turn_rate),
        ))
    }
}

#[derive(Resource)]
struct ShutdownReceiver(Arc<Mutex<Receiver<()>>>);

#[derive(Component)]
#[require(Replicated)]
/// A player character spawned by the server
struct Character;

#[derive(Component, Debug)]
/// Connected client entity driving this character
struct Controller(Entity);

fn main() {
    let args = Args::parse();

    let (tx, rx) = channel();
    ctrlc::set_handler(move || {
        tx.send(()).expect("Could not send signal on channel.");
    })
    .expect("Error setting Ctrl-C handler");

    let mut app = App::new();
    app.insert_resource(args.tuning());
    app.insert_resource(args);
    app.insert_resource(ShutdownReceiver(Arc::new(Mutex::new(rx))));
    app.insert_resource(PeerRole::Authority);

    configure_plugins(&mut app);
    configure_systems(&mut app);
    configure_replication(&mut app);

    app.run();
}

fn configure_plugins(app: &mut App) {
    app.add_plugins(MinimalPlugins)
        .add_plugins((LogPlugin::default(), StatesPlugin))
        .add_plugins((RepliconPlugins, RepliconQuinnetPlugins))
        .add_plugins(SprintPlugin);
}

fn configure_replication(app: &mut App) {
    app.add_sprint_replication();
}

fn configure_systems(app: &mut App) {
    app.add_systems(Startup, setup_server);
    app.add_systems(Update, check_shutdown);
    app.add_systems(Last, disconnect_observer);

    app.add_observer(spawn_character)
        .add_observer(despawn_character)
        .add_observer(on_sprint_intent)
        .add_observer(log_sprint_start)
        .add_observer(log_sprint_stop);
}

fn check_shutdown(receiver: Res<ShutdownReceiver>, mut exit: MessageWriter<AppExit>) {
    if let Ok(rx) = receiver.0.lock() {
        if rx.try_recv().is_ok() {
            exit.write(AppExit::Success);
        }
    }
}

fn spawn_character(add: On<Add, ConnectedClient>, tuning: Res<SprintTuning>, mut commands: Commands) {
    let character = commands
        .spawn((
            Character,
            Controller(add.entity),
            SprintComponent::new(**tuning),
            CharacterMovement::default(),
        ))
        .id();
    info!("Client {} connected, spawned character {character}", add.entity);
}

fn despawn_character(
    remove: On<Remove, ConnectedClient>,
    characters: Query<(Entity, &Controller)>,
    mut commands: Commands,
) {
    for (character, _) in characters
        .iter()
        .filter(|(_, controller)| controller.0 == remove.entity)
    {
        info!("Client {} disconnected, despawning {character}", remove.entity);
        commands.entity(character).despawn();
    }
}

fn on_sprint_intent(
    intent: On<FromClient<SprintIntent>>,
    characters: Query<(Entity, &Controller)>,
    mut commands: Commands,
) {
    let Some(client) = intent.client_id.entity() else {
        return;
    };

    match characters.iter().find(|(_, controller)| controller.0 == client) {
        Some((character, _)) => commands.request_sprint(character, intent.active),
        None => debug!("Sprint intent from {client} without a character"),
    }
}

fn log_sprint_start(started: On<SprintStarted>, movements: Query<&CharacterMovement>) {
    info!(
        "{} started sprinting: {:?}",
        started.entity,
        movements.get(started.entity).ok()
    );
}

fn log_sprint_stop(stopped: On<SprintStopped>, movements: Query<&CharacterMovement>) {
    info!(
        "{} stopped sprinting: {:?}",
        stopped.entity,
        movements.get(stopped.entity).ok()
    );
}

fn setup_server(
    args: Res<Args>,
    channels: Res<RepliconChannels>,
    mut server: ResMut<QuinnetServer>,
) {
    let (ip, port) = (args.ip, args.port);

    server
        .start_endpoint(ServerEndpointConfiguration {
            addr_config: EndpointAddrConfiguration::from_ip(ip, port),
            cert_mode: CertificateRetrievalMode::GenerateSelfSigned {
                server_hostname: Ipv6Addr::LOCALHOST.to_string(),
            },
            defaultables: ServerEndpointConfigurationDefaultables {
                send_channels_cfg: channels.server_configs(),
            },
        })
        .unwrap();

    info!(
        "Server listening on [{ip}]:{port}, sprint tuning {:?}",
        args.tuning()
    );
}

fn disconnect_observer(mut exit_events: MessageReader<AppExit>, mut server: ResMut<QuinnetServer>) {
    for _event in exit_events.read() {
        info!("Shutting down server...");
        if let Err(e) = server.stop_endpoint() {
            warn!("Failed to stop server endpoint: {:?}", e);
        }
    }
}
