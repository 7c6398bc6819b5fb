mod settings;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use loopcheck_core::{
    demo_byte_table, demo_delay_table, trace, transmit_for, ByteChannel, ChannelConfig,
    FixedSelector, InputSelector, LoopbackTest, MemoryLink, SerialChannel, TracedChannel,
};
use settings::Settings;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "loopcheck", version, about = "Serial byte-loopback self-test tool")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all log output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List available serial ports
    Ports,
    /// Run the byte-loopback self-test
    Loopback(LoopbackArgs),
    /// Run the button-driven transmit demo
    Demo(DemoArgs),
}

#[derive(Args)]
struct TransportArgs {
    /// Serial port to open (falls back to the saved default)
    #[arg(long)]
    port: Option<String>,

    /// Baud rate (falls back to the saved default, then 115200)
    #[arg(long)]
    baud: Option<u32>,

    /// Receive timeout in milliseconds
    #[arg(long, default_value_t = 500)]
    timeout_ms: u64,

    /// Use an in-memory loopback link instead of a serial port
    #[arg(long)]
    sim: bool,
}

#[derive(Args)]
struct LoopbackArgs {
    #[command(flatten)]
    transport: TransportArgs,

    /// Byte pattern as a hex string (default: the 0x00..0xFF ramp)
    #[arg(long)]
    pattern: Option<String>,

    /// Emit the validation report as JSON
    #[arg(long)]
    json: bool,

    /// Dump the full TX/RX exchange trace after the run
    #[arg(long)]
    trace: bool,

    /// Persist --port/--baud as defaults for later runs
    #[arg(long)]
    save_defaults: bool,
}

#[derive(Args)]
struct DemoArgs {
    #[command(flatten)]
    transport: TransportArgs,

    /// Treat the first button as held down
    #[arg(long)]
    first_pressed: bool,

    /// Treat the second button as held down
    #[arg(long)]
    second_pressed: bool,

    /// Number of demo iterations
    #[arg(long, default_value_t = 4)]
    count: u32,

    /// Skip the per-state delay between iterations
    #[arg(long)]
    no_delay: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    stderrlog::new()
        .modules([module_path!(), "loopcheck_core"])
        .quiet(cli.quiet)
        .verbosity(cli.verbose as usize + 1)
        .init()?;

    match cli.command {
        Command::Ports => cmd_ports(),
        Command::Loopback(args) => cmd_loopback(args),
        Command::Demo(args) => cmd_demo(args),
    }
}

fn cmd_ports() -> Result<()> {
    let ports = SerialChannel::list_ports();
    if ports.is_empty() {
        println!("no serial ports found");
        return Ok(());
    }
    for p in ports {
        if let (Some(vid), Some(pid)) = (p.vid, p.pid) {
            println!(
                "{} [{}] {:04X}:{:04X} {}",
                p.port_name,
                p.port_type,
                vid,
                pid,
                p.product.as_deref().unwrap_or("")
            );
        } else {
            println!("{} [{}]", p.port_name, p.port_type);
        }
    }
    Ok(())
}

fn open_channel(transport: &TransportArgs, saved: &Settings) -> Result<Box<dyn ByteChannel>> {
    let timeout = Duration::from_millis(transport.timeout_ms);
    if transport.sim {
        return Ok(Box::new(MemoryLink::loopback(timeout)));
    }
    let port_name = transport
        .port
        .clone()
        .or_else(|| saved.port.clone())
        .context("no port given; pass --port, --sim, or save a default with --save-defaults")?;
    let cfg = ChannelConfig {
        port_name,
        baud_rate: transport.baud.or(saved.baud).unwrap_or(115_200),
        timeout,
        ..Default::default()
    };
    let channel = SerialChannel::open(cfg).context("failed to open serial port")?;
    Ok(Box::new(channel))
}

fn cmd_loopback(args: LoopbackArgs) -> Result<()> {
    let mut saved = Settings::load();
    if args.save_defaults {
        if let Some(port) = &args.transport.port {
            saved.port = Some(port.clone());
        }
        if let Some(baud) = args.transport.baud {
            saved.baud = Some(baud);
        }
        saved.save()?;
    }

    let test = match &args.pattern {
        Some(text) => {
            let bytes = hex::decode(text.trim())
                .context("--pattern must be an even-length hex string")?;
            if bytes.is_empty() {
                bail!("--pattern must contain at least one byte");
            }
            LoopbackTest::with_pattern(bytes)
        }
        None => LoopbackTest::ramp(),
    };

    let inner = open_channel(&args.transport, &saved)?;
    let exchange = trace::shared(2 * test.pattern().len() + 16);
    let mut channel = TracedChannel::new(inner, exchange.clone());

    let run = test.run(&mut channel).context("loopback run aborted")?;
    let report = run.validate();

    if args.trace {
        print!("{}", exchange.lock().to_text(true));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for m in &report.mismatches {
            println!(
                "MISMATCH at {}: sent 0x{:02X}, received 0x{:02X}",
                m.index, m.sent, m.received
            );
        }
        println!(
            "{} exchanges, {} mismatches: {}",
            report.total,
            report.mismatches.len(),
            if report.passed() { "PASS" } else { "FAIL" }
        );
    }

    if !report.passed() {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_demo(args: DemoArgs) -> Result<()> {
    let saved = Settings::load();
    let selector = FixedSelector::from_pressed(args.first_pressed, args.second_pressed);
    let bytes = demo_byte_table();
    let delays = demo_delay_table();
    let mut channel = open_channel(&args.transport, &saved)?;

    for _ in 0..args.count {
        let state = selector.read();
        let sent = transmit_for(&selector, &bytes, channel.as_mut())?;
        let delay = delays.lookup(state)?;
        if args.transport.sim {
            // Drain our own echo so the simulated link doesn't fill up.
            let echoed = channel.receive()?;
            println!("state 0x{:02X}: sent 0x{sent:02X}, echoed 0x{echoed:02X}", state.code());
        } else {
            println!("state 0x{:02X}: sent 0x{sent:02X}", state.code());
        }
        if !args.no_delay {
            std::thread::sleep(delay);
        }
    }
    Ok(())
}
