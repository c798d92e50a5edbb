#![cfg_attr(not(feature = "dev"), windows_subsystem = "windows")]

use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use bevy_enhanced_input::prelude::*;
use bevy_inspector_egui::quick::WorldInspectorPlugin;
use bevy_panic_handler::PanicHandlerBuilder;
use bevy_quinnet::client::{
    ClientConnectionConfiguration, ClientConnectionConfigurationDefaultables, QuinnetClient,
    certificate::CertificateVerificationMode,
    connection::{ClientAddrConfiguration, ConnectionEvent},
};
use bevy_replicon::prelude::*;
use bevy_replicon_quinnet::{ChannelsConfigurationExt, RepliconQuinnetPlugins};
use clap::Parser;
use shared::{
    CharacterMovement, PeerRole, SprintAction, SprintComponent, SprintPlugin,
    SprintReplicationExt, SprintStarted, SprintStopped, SprintSystems, SprintTuning, Sprinting,
};
use std::net::{IpAddr, Ipv6Addr};

const WALK_COLOR: Color = Color::linear_rgb(0.0, 1.0, 0.0);
const SPRINT_COLOR: Color = Color::linear_rgb(1.0, 0.5, 0.0);
const OTHER_COLOR: Color = Color::linear_rgb(1.0, 0.0, 0.0);

#[derive(Resource, Parser)]
struct Args {
    #[arg(short, long, default_value_t = Ipv6Addr::LOCALHOST.into())]
    ip: IpAddr,
    #[arg(short, long, default_value_t = 5000)]
    port: u16,
    /// Run without a server, this client is the authority
    #[arg(long)]
    local: bool,
    /// Show the world inspector
    #[arg(long)]
    inspector: bool,
}

#[derive(Component)]
#[require(Transform)]
struct LocalPlayer;

#[derive(Component)]
/// Color a character returns to when it stops sprinting
struct RestColor(Color);

fn main() {
    let args = Args::parse();

    let mut app = App::new();
    app.insert_resource(if args.local {
        PeerRole::Authority
    } else {
        PeerRole::Observer
    });
    app.init_resource::<SprintTuning>();

    configure_plugins(&mut app, &args);
    configure_systems(&mut app);
    configure_replication(&mut app);

    app.insert_resource(args);
    app.run();
}

fn configure_plugins(app: &mut App, args: &Args) {
    app.add_plugins(DefaultPlugins)
        .add_plugins((EnhancedInputPlugin, PanicHandlerBuilder::default().build()))
        .add_plugins((RepliconPlugins, RepliconQuinnetPlugins))
        .add_plugins(SprintPlugin)
        .add_input_context::<LocalPlayer>();

    if args.inspector {
        app.add_plugins((EguiPlugin::default(), WorldInspectorPlugin::new()));
    }
}

fn configure_replication(app: &mut App) {
    app.add_sprint_replication();
}

fn configure_systems(app: &mut App) {
    app.add_systems(Startup, setup_client);
    app.add_systems(
        Update,
        (read_connected, handle_new_characters.before(SprintSystems)),
    );
    app.add_systems(Last, disconnect_observer);

    app.add_observer(tint_on_sprint_start)
        .add_observer(tint_on_sprint_stop);
}

fn setup_client(
    args: Res<Args>,
    tuning: Res<SprintTuning>,
    channels: Res<RepliconChannels>,
    mut client: ResMut<QuinnetClient>,
    mut commands: Commands,
) {
    commands.spawn(Camera2d);

    if args.local {
        info!("Local mode: skipping networking");
        let player = spawn_local_player(&mut commands, &tuning);
        commands.entity(player).insert((
            CharacterMovement::default(),
            Sprite::from_color(WALK_COLOR, Vec2::splat(50.0)),
            RestColor(WALK_COLOR),
        ));
        return;
    }

    let (ip, port) = (args.ip, args.port);

    client
        .open_connection(ClientConnectionConfiguration {
            addr_config: ClientAddrConfiguration::from_ips(ip, port, Ipv6Addr::UNSPECIFIED, 0),
            cert_mode: CertificateVerificationMode::SkipVerification,
            defaultables: ClientConnectionConfigurationDefaultables {
                send_channels_cfg: channels.client_configs(),
            },
        })
        .unwrap();

    info!("Client connecting to [{ip}]:{port}");
}

/// Spawns the input context with its sprint action and points the sprint component at it.
fn spawn_local_player(commands: &mut Commands, tuning: &SprintTuning) -> Entity {
    let player = commands.spawn(LocalPlayer).id();
    let action = commands
        .spawn((
            ActionOf::<LocalPlayer>::new(player),
            Action::<SprintAction>::new(),
            bindings![KeyCode::ShiftLeft, GamepadButton::LeftThumb],
        ))
        .id();

    commands
        .entity(player)
        .insert(SprintComponent::new(**tuning).with_input_action(action));
    player
}

fn read_connected(
    mut reader: MessageReader<ConnectionEvent>,
    tuning: Res<SprintTuning>,
    mut commands: Commands,
) {
    for message in reader.read() {
        info!("Connected as client {:?}", message.client_id);
        // Requests from this player are routed to the server's copy of the character.
        spawn_local_player(&mut commands, &tuning);
    }
}

fn handle_new_characters(
    query: Query<Entity, (Added<Sprinting>, Without<LocalPlayer>)>,
    mut spawned: Local<u32>,
    mut commands: Commands,
) {
    for entity in query.iter() {
        let x = *spawned as f32 * 70.0;
        *spawned += 1;

        commands.entity(entity).insert((
            Sprite::from_color(OTHER_COLOR, Vec2::splat(50.0)),
            RestColor(OTHER_COLOR),
            Transform::from_xyz(x, 0.0, 0.0),
        ));
    }
}

fn tint_on_sprint_start(started: On<SprintStarted>, mut sprites: Query<&mut Sprite>) {
    if let Ok(mut sprite) = sprites.get_mut(started.entity) {
        sprite.color = SPRINT_COLOR;
    }
}

fn tint_on_sprint_stop(
    stopped: On<SprintStopped>,
    mut sprites: Query<(&mut Sprite, &RestColor)>,
) {
    if let Ok((mut sprite, rest)) = sprites.get_mut(stopped.entity) {
        sprite.color = rest.0;
    }
}

fn disconnect_observer(mut exit_events: MessageReader<AppExit>, mut client: ResMut<QuinnetClient>) {
    for _event in exit_events.read() {
        info!("Disconnecting all connections...");
        let connection_ids: Vec<u64> = client.connections().map(|(id, _)| *id).collect();

        for connection_id in connection_ids {
            if let Err(e) = client.close_connection(connection_id) {
                warn!("Failed to close connection {}: {:?}", connection_id, e);
            }
        }
    }
}
