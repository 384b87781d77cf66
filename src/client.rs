use crate::{
    controller::{
        self,
        Effect,
        Msg,
        Notice,
        ServiceRequest,
        ServiceResponse,
        TransportError,
        Transport,
        ViewState,
    },
    http_service::HttpDataService,
    in_memory_service::InMemoryDataService,
    service::{
        DataService,
        ExportFile,
    },
    ui,
    view::{
        RenderScope,
        ViewModel,
    },
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use std::{
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};
use tokio::{
    sync::mpsc,
    time,
};
use tracing::{
    debug,
    error,
    info,
    warn,
};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::EnvFilter;

pub const DEMO_BET_COUNT: usize = 180;
const LOG_FILE_PREFIX: &str = "bet-ledger.log";
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Backend {
    Remote { url: String },
    Demo,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub backend: Backend,
    pub export_dir: PathBuf,
    pub log_dir: PathBuf,
}

/// Routes tracing output to a daily log file; the terminal belongs to the UI.
pub fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .wrap_err_with(|| format!("failed to create log dir {}", log_dir.display()))?;
    let appender = rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| eyre!("failed to install tracing subscriber: {e}"))?;
    Ok(guard)
}

fn transport<T>(res: Result<T>) -> Transport<T> {
    res.map_err(|e| TransportError(format!("{e:#}")))
}

/// Performs one service call. `Shutdown` has no reply.
pub async fn dispatch<S: DataService>(
    service: &S,
    request: ServiceRequest,
) -> Option<ServiceResponse> {
    let response = match request {
        ServiceRequest::Query(request) => {
            let result = transport(service.query(&request.filters).await);
            ServiceResponse::Loaded { request, result }
        }
        ServiceRequest::GetBet(id) => {
            ServiceResponse::Fetched(transport(service.get_bet(id).await))
        }
        ServiceRequest::Create(draft) => {
            ServiceResponse::Saved(transport(service.create_bet(&draft).await))
        }
        ServiceRequest::Update(id, draft) => {
            ServiceResponse::Saved(transport(service.update_bet(id, &draft).await))
        }
        ServiceRequest::Delete(id) => {
            ServiceResponse::Deleted(transport(service.delete_bet(id).await))
        }
        ServiceRequest::Export => {
            ServiceResponse::Exported(transport(service.export().await))
        }
        ServiceRequest::Import(bytes) => {
            ServiceResponse::Imported(transport(service.import(&bytes).await))
        }
        ServiceRequest::Shutdown => {
            if let Err(err) = service.shutdown().await {
                debug!(?err, "data service shutdown failed");
            }
            return None;
        }
    };
    Some(response)
}

/// Runs calls one at a time and forwards each reply. Stops after `Shutdown`.
async fn service_worker<S: DataService>(
    service: S,
    mut cmd_rx: mpsc::UnboundedReceiver<ServiceRequest>,
    reply_tx: mpsc::UnboundedSender<ServiceResponse>,
) -> Result<()> {
    while let Some(request) = cmd_rx.recv().await {
        let shutdown = matches!(request, ServiceRequest::Shutdown);
        if let Some(reply) = dispatch(&service, request).await
            && reply_tx.send(reply).is_err()
        {
            warn!("reply receiver dropped");
            break;
        }
        if shutdown {
            break;
        }
    }
    Ok(())
}

/// Writes `file` into `dir` under its own base name.
pub async fn save_file(dir: &Path, file: &ExportFile) -> Result<PathBuf> {
    let name = Path::new(&file.filename)
        .file_name()
        .ok_or_else(|| eyre!("invalid file name {:?}", file.filename))?;
    tokio::fs::create_dir_all(dir)
        .await
        .wrap_err_with(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(name);
    tokio::fs::write(&path, &file.bytes)
        .await
        .wrap_err_with(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    match &config.backend {
        Backend::Remote { url } => {
            let service = HttpDataService::new(url.clone())?;
            info!(%service, "using remote data service");
            run_with(service, &config).await
        }
        Backend::Demo => {
            info!(bets = DEMO_BET_COUNT, "using seeded in-memory data service");
            run_with(InMemoryDataService::seeded(DEMO_BET_COUNT), &config).await
        }
    }
}

async fn run_with<S: DataService>(service: S, config: &AppConfig) -> Result<()> {
    let mut ui_state = ui::UiState::new(chrono::Local::now().date_naive());
    let mut input_events = ui::input_event_stream();

    ui::terminal_enter(&mut ui_state)?;
    info!("UI ready");
    let res = run_loop(service, config, &mut ui_state, &mut input_events).await;
    ui::terminal_exit()?;
    res
}

struct Session<'a> {
    state: ViewState,
    view: ViewModel,
    cmd_tx: mpsc::UnboundedSender<ServiceRequest>,
    export_dir: &'a Path,
}

impl Session<'_> {
    async fn step(&mut self, ui_state: &mut ui::UiState, msg: Msg) {
        let (next, effects) = controller::update(std::mem::take(&mut self.state), msg);
        self.state = next;
        for effect in effects {
            self.apply(ui_state, effect).await;
        }
        self.view.loading = self.state.in_flight.load;
    }

    async fn apply(&mut self, ui_state: &mut ui::UiState, effect: Effect) {
        match effect {
            Effect::Call(request) => {
                if self.cmd_tx.send(request).is_err() {
                    error!("service worker is gone");
                    ui_state.show_notice(Notice::error("Data service is not running."));
                }
            }
            Effect::Render(scope) => {
                self.view.refresh(scope, &self.state);
                if matches!(scope, RenderScope::Full | RenderScope::Filters) {
                    ui_state.sync_filters(&self.view);
                }
                if matches!(scope, RenderScope::Full | RenderScope::Table) {
                    ui_state.clamp_selection(self.view.rows.len());
                }
            }
            Effect::Notify(notice) => ui_state.show_notice(notice),
            Effect::Confirm(prompt) => ui_state.ask(prompt),
            Effect::FillForm(fields) => ui_state.fill_form(fields),
            Effect::ClearForm => ui_state.clear_form(),
            Effect::SaveFile(file) => match save_file(self.export_dir, &file).await {
                Ok(path) => {
                    info!(path = %path.display(), "file saved");
                    ui_state.show_notice(Notice::info(format!("Saved {}", path.display())));
                }
                Err(e) => {
                    error!(error = %e, "saving file failed");
                    ui_state.show_notice(Notice::error(format!("Could not save file: {e}")));
                }
            },
        }
    }
}

async fn run_loop<S: DataService>(
    service: S,
    config: &AppConfig,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEventReceiver,
) -> Result<()> {
    info!("Running app loop");
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
    let worker = tokio::spawn(service_worker(service, cmd_rx, reply_tx));

    let state = ViewState::default();
    let mut session = Session {
        view: ViewModel::build(&state),
        state,
        cmd_tx,
        export_dir: &config.export_dir,
    };
    session.step(ui_state, Msg::Start).await;
    ui::draw(ui_state, &session.view).wrap_err("initial draw failed")?;

    loop {
        tokio::select! {
            reply = reply_rx.recv() => {
                let Some(reply) = reply else {
                    warn!("service worker channel closed");
                    break;
                };
                session.step(ui_state, Msg::Replied(reply)).await;
                ui::draw(ui_state, &session.view).wrap_err("draw after service reply failed")?;
            }
            _ = tokio::signal::ctrl_c() => {
                session.step(ui_state, Msg::Quit).await;
                break;
            }
            raw_ev = ui::next_raw_event(input_events) => {
                let event = raw_ev?;
                let Some(ev) = ui::interpret_event(ui_state, &session.view, event) else {
                    continue;
                };
                match ev {
                    ui::UserEvent::Quit => {
                        session.step(ui_state, Msg::Quit).await;
                        break;
                    }
                    ui::UserEvent::Redraw => {}
                    ui::UserEvent::Send(msg) => session.step(ui_state, msg).await,
                    ui::UserEvent::ImportFrom(raw) => {
                        let path = PathBuf::from(shellexpand::tilde(&raw).into_owned());
                        match tokio::fs::read(&path).await {
                            Ok(bytes) => session.step(ui_state, Msg::Import(bytes)).await,
                            Err(e) => {
                                warn!(error = %e, path = %path.display(), "import file unreadable");
                                ui_state.show_notice(Notice::error(format!(
                                    "Could not read {}: {e}",
                                    path.display()
                                )));
                            }
                        }
                    }
                }
                ui::draw(ui_state, &session.view).wrap_err("draw after input failed")?;
            }
        }
    }

    drop(session);
    match time::timeout(SHUTDOWN_TIMEOUT, worker).await {
        Ok(Ok(res)) => res,
        Ok(Err(e)) => Err(eyre!("service worker panicked: {e}")),
        Err(_) => {
            warn!("data service did not shut down in time");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::{
        bet::BetId,
        controller::LoadRequest,
        in_memory_service::RecordedCall,
        service::Filters,
    };

    #[tokio::test]
    async fn dispatch__query_echoes_request() {
        // given
        let service = InMemoryDataService::new();
        let request = LoadRequest {
            filters: Filters::default(),
            reset_page: false,
        };

        // when
        let reply = dispatch(&service, ServiceRequest::Query(request.clone())).await;

        // then
        match reply {
            Some(ServiceResponse::Loaded { request: echoed, result }) => {
                assert_eq!(echoed, request);
                assert!(result.unwrap().bets.is_empty());
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[tokio::test]
    async fn dispatch__transport_failure_becomes_transport_error() {
        let service = InMemoryDataService::new();
        service.set_unreachable(true);
        let reply = dispatch(&service, ServiceRequest::Delete(BetId(3))).await;
        assert!(matches!(reply, Some(ServiceResponse::Deleted(Err(_)))));
    }

    #[tokio::test]
    async fn service_worker__stops_after_shutdown() {
        // given
        let service = InMemoryDataService::new();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(service_worker(service.clone(), cmd_rx, reply_tx));

        // when
        cmd_tx.send(ServiceRequest::Export).unwrap();
        let reply = reply_rx.recv().await;
        cmd_tx.send(ServiceRequest::Shutdown).unwrap();
        handle.await.unwrap().unwrap();

        // then
        assert!(matches!(reply, Some(ServiceResponse::Exported(Ok(Ok(_))))));
        assert!(service.is_shut_down());
        assert_eq!(service.calls(), vec![RecordedCall::Export, RecordedCall::Shutdown]);
    }

    #[tokio::test]
    async fn save_file__writes_under_base_name() {
        // given
        let dir = tempfile::tempdir().unwrap();
        let file = ExportFile {
            filename: "../nested/bet_history.xlsx".to_string(),
            bytes: vec![1, 2, 3],
        };

        // when
        let path = save_file(dir.path(), &file).await.unwrap();

        // then
        assert_eq!(path, dir.path().join("bet_history.xlsx"));
        assert_eq!(std::fs::read(path).unwrap(), vec![1, 2, 3]);
    }
}
