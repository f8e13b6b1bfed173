mod config;
mod events;
mod node;
mod scenario;
mod tui;

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use simbridge::net::{DEFAULT_DIS_PORT, UdpHandler};

use config::{NodeConfig, default_ntm, load_ntm};
use events::NodeEvent;
use node::Node;
use tui::TuiState;

#[derive(Parser)]
#[command(name = "simbridge-node")]
#[command(about = "DIS node running a scripted air defence scenario")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    #[arg(short, long, default_value_t = DEFAULT_DIS_PORT)]
    port: u16,

    #[arg(
        short,
        long,
        default_value = "255.255.255.255",
        help = "Destination address (broadcast or unicast)"
    )]
    destination: String,

    #[arg(long, help = "Destination port; defaults to --port")]
    destination_port: Option<u16>,

    #[arg(short, long, help = "JSON node configuration")]
    config: Option<PathBuf>,

    #[arg(long, help = "JSON network type map")]
    ntm: Option<PathBuf>,

    #[arg(long)]
    site: Option<u16>,

    #[arg(long)]
    application: Option<u16>,

    #[arg(long)]
    exercise: Option<u8>,

    #[arg(short, long)]
    tick_rate: Option<u32>,

    #[arg(long)]
    headless: bool,

    #[arg(long, help = "Stop after this many seconds (headless only)")]
    duration: Option<f64>,
}

impl Args {
    fn node_config(&self) -> Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => NodeConfig::load(path)?,
            None => NodeConfig::default(),
        };
        if let Some(site) = self.site {
            config.netio.site = site;
        }
        if let Some(application) = self.application {
            config.netio.application = application;
        }
        if let Some(exercise) = self.exercise {
            config.netio.exercise = exercise;
        }
        if let Some(tick_rate) = self.tick_rate {
            config.tick_rate = tick_rate;
        }
        Ok(config)
    }

    fn destination(&self) -> Result<SocketAddr> {
        let port = self.destination_port.unwrap_or(self.port);
        (self.destination.as_str(), port)
            .to_socket_addrs()?
            .next()
            .with_context(|| format!("no address for {}", self.destination))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let config = args.node_config()?;
    let ntm = match &args.ntm {
        Some(path) => load_ntm(path)?,
        None => default_ntm(),
    };
    let bind_addr = format!("{}:{}", args.bind, args.port);
    let handler = UdpHandler::bind(&bind_addr, args.destination()?)
        .with_context(|| format!("binding {bind_addr}"))?;
    let description = format!(
        "site {} application {} exercise {} on {} -> {}",
        config.netio.site,
        config.netio.application,
        config.netio.exercise,
        handler.local_addr(),
        handler.destination()
    );

    let mut node = Node::new(handler, config, ntm);
    node.log_event(NodeEvent::Started { description });

    if args.headless {
        node.run(args.duration.map(Duration::from_secs_f64));
        log::info!("node shutting down");
    } else {
        run_with_tui(&mut node)?;
    }

    Ok(())
}

fn run_with_tui(node: &mut Node<UdpHandler>) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let running = node.running();
    let mut tui_state = TuiState::new();

    while running.load(Ordering::SeqCst) {
        node.tick_once();
        for event in node.drain_events() {
            tui_state.log_event(&event);
        }

        if event::poll(Duration::from_millis(1))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => running.store(false, Ordering::SeqCst),
                KeyCode::Tab => tui_state.next_tab(),
                KeyCode::PageUp => tui_state.scroll_up(),
                KeyCode::PageDown => tui_state.scroll_down(),
                KeyCode::End => tui_state.scroll_to_bottom(),
                _ => {}
            }
        }

        let stats = node.stats();
        terminal.draw(|frame| {
            tui::render(frame, &tui_state, &stats);
        })?;
    }

    tui_state.log_info("Shutting down...");
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    Ok(())
}
