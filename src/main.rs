use log::{error, info};
use probed::alert::{AlertBus, LogSink, WebhookSink};
use probed::data_model::settings::{AppSettings, Command};
use probed::probe_engine::default_checker;
use probed::registry::{ProbeRegistry, add_record, list_records, remove_record};
use probed::settings::load_from_cli;
use probed::storage::{JsonFileStore, ProbeStore};
use std::io;
use std::sync::Arc;

fn main() -> io::Result<()> {
    probed::init_logging();

    let settings = load_from_cli()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;
    let store = JsonFileStore::open(&settings.db_path).map_err(io::Error::other)?;

    match settings.command.clone() {
        Command::Run => run(settings, Arc::new(store)),
        Command::Add(record) => {
            add_record(&store, &record).map_err(io::Error::other)?;
            println!("added probe [{}]", record.name);
            Ok(())
        }
        Command::Remove { name } => {
            remove_record(&store, &name).map_err(io::Error::other)?;
            println!("removed probe [{name}]");
            Ok(())
        }
        Command::List => {
            for record in list_records(&store).map_err(io::Error::other)? {
                println!("{:<24} {:>6}s  {}", record.name, record.delay, record.url);
            }
            Ok(())
        }
    }
}

fn run(settings: AppSettings, store: Arc<dyn ProbeStore>) -> io::Result<()> {
    let mut bus = AlertBus::start(settings.alerts.clone())?;
    bus.subscribe(Box::new(LogSink))?;
    if let Some(url) = settings.webhook.clone() {
        bus.subscribe(Box::new(WebhookSink::new(url, settings.transport.timeout)))?;
    }

    let checker = default_checker(settings.transport.clone(), settings.process.clone());
    let registry = ProbeRegistry::open(
        store,
        Arc::new(checker),
        bus.publisher(),
        settings.registry.clone(),
    )
    .map_err(io::Error::other)?;

    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })
    .map_err(io::Error::other)?;

    info!(
        "monitoring {} probes from {}",
        registry.read_all().len(),
        settings.db_path.display()
    );
    if stop_rx.recv().is_err() {
        error!("interrupt handler went away, shutting down");
    }

    info!("shutting down");
    registry.shutdown();
    let dropped = bus.dropped();
    bus.shutdown();
    if dropped > 0 {
        info!("{dropped} alerts were dropped while the bus was full");
    }
    Ok(())
}
