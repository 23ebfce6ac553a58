use std::error::Error;

use bpaf::{Bpaf, Parser};
use skyloong_sync_core::{Board, Rgb};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::detection::{candidates, open_board};
use crate::frame::{apply_frame, per_key, validate_frame, Frame, KeyColor};
use crate::lock::DeviceLock;

mod config;
mod daemon;
mod detection;
mod frame;
mod lock;

#[derive(Clone, Debug, Bpaf)]
struct SetArgs {
    /// Base color for every key (hex: #RRGGBB or #RGB), defaults to the configured color
    #[bpaf(short, long, argument("HEX"))]
    color: Option<Rgb>,
    /// Color a single key, e.g. "Key: Escape=#ff0000". May be repeated.
    #[bpaf(short, long("key"), argument("NAME=HEX"))]
    keys: Vec<KeyColor>,
    /// Brightness from 0 to 134, defaults to the configured brightness
    #[bpaf(short, long, argument("LEVEL"))]
    brightness: Option<u8>,
}

#[derive(Clone, Debug, Bpaf)]
#[bpaf(options, version, descr(env!("CARGO_PKG_DESCRIPTION")))]
struct Cli {
    /// HID path of the keyboard lighting interface, auto-detected when omitted
    #[bpaf(long, argument("PATH"))]
    path: Option<String>,
    #[bpaf(external(command))]
    command: Command,
}

#[derive(Clone, Debug)]
enum Command {
    /// Hold the configured colors on the keyboard until interrupted (default).
    Run,
    /// List detected lighting interfaces.
    List,
    /// Identify the connected keyboard model.
    Identify,
    /// Print the key matrix of the connected keyboard.
    Layout,
    /// Show one frame of colors until interrupted, without reconnecting.
    Set(SetArgs),
}

fn command() -> impl Parser<Command> {
    let run = bpaf::pure(Command::Run)
        .to_options()
        .descr("Hold the configured colors on the keyboard until interrupted")
        .command("run")
        .help("Hold the configured colors on the keyboard until interrupted (default)");

    let list = bpaf::pure(Command::List)
        .to_options()
        .descr("List detected lighting interfaces")
        .command("list")
        .help("List detected lighting interfaces");

    let identify = bpaf::pure(Command::Identify)
        .to_options()
        .descr("Identify the connected keyboard model")
        .command("identify")
        .help("Identify the connected keyboard model");

    let layout = bpaf::pure(Command::Layout)
        .to_options()
        .descr("Print the key matrix of the connected keyboard")
        .command("layout")
        .help("Print the key matrix of the connected keyboard");

    let set = set_args()
        .map(Command::Set)
        .to_options()
        .descr("Show colors given on the command line until interrupted")
        .command("set")
        .help("Show colors given on the command line until interrupted");

    bpaf::construct!([run, list, identify, layout, set]).fallback(Command::Run)
}

/// Merge command line overrides on top of the configured frame
fn merge_frame(mut frame: Frame, args: SetArgs) -> Frame {
    if let Some(color) = args.color {
        frame.base = color;
    }
    if let Some(brightness) = args.brightness {
        frame.brightness = brightness;
    }
    frame.keys.extend(args.keys);
    frame
}

fn print_layout(board: &mut dyn Board) -> Result<(), Box<dyn Error>> {
    let rgb = per_key(board)?;
    let leds = rgb.leds();
    for row in rgb.matrix().rows() {
        let line: Vec<String> = row
            .iter()
            .map(|cell| match cell {
                Some(i) => format!("{:<13}", leds[*i].name.trim_start_matches("Key: ")),
                None => format!("{:<13}", "."),
            })
            .collect();
        println!("{}", line.join(" ").trim_end());
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = cli().run();
    let config = Config::load_or_create()?;
    let options = config.timing.driver_options();
    let path = cli.path.or_else(|| config.general.device_path.clone());

    match cli.command {
        Command::Run => {
            let _lock = DeviceLock::acquire("run")?;
            let frame = Frame::from_config(&config)?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(daemon::daemon_loop(config, frame, path))
        },
        Command::List => {
            let found = candidates()?;
            if found.is_empty() {
                println!("no lighting interfaces found");
            }
            for candidate in found {
                println!(
                    "{}  {} ({})",
                    candidate.path,
                    candidate.board,
                    candidate.product.as_deref().unwrap_or("unknown product")
                );
            }
            Ok(())
        },
        Command::Identify => {
            let _lock = DeviceLock::acquire("identify")?;
            let board = open_board(path.as_deref(), options)?;
            match board.model_id() {
                Some(id) => println!("{} (model id {id}) at {}", board.name(), board.location()),
                None => println!("{} at {}", board.name(), board.location()),
            }
            board.close()?;
            Ok(())
        },
        Command::Layout => {
            let _lock = DeviceLock::acquire("layout")?;
            let mut board = open_board(path.as_deref(), options)?;
            print_layout(board.as_mut())?;
            board.close()?;
            Ok(())
        },
        Command::Set(args) => {
            let _lock = DeviceLock::acquire("set")?;
            let frame = merge_frame(Frame::from_config(&config)?, args);
            let mut board = open_board(path.as_deref(), options)?;
            validate_frame(board.as_mut(), &frame)?;
            apply_frame(board.as_mut(), &frame)?;
            println!(
                "showing {} at brightness {} on {}, press Ctrl-C to release",
                frame.base,
                frame.brightness,
                board.name()
            );
            let rt = tokio::runtime::Runtime::new()?;
            let held = rt.block_on(daemon::hold(board.as_mut(), &frame, &config));
            let closed = board.close();
            held?;
            Ok(closed?)
        },
    }
}
