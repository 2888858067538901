use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexSet;
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxBuildHasher;
use tracing::{debug, error, info, warn};

use super::{find_files, relative_to, AssetFilter, BuildOptions, Builder, CompileJob};
use crate::config::AssetInput;
use crate::errors::Result;
use crate::{INCLUDE_EXT, SCRIPT_EXT};

/// How often the event loop checks its stop flag and missing roots
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Events arriving within this window after the first one form one batch
const SETTLE_WINDOW: Duration = Duration::from_millis(50);

type ChangeSet = IndexSet<PathBuf, FxBuildHasher>;

/// Cancellation signal for a running [`WatchSession`]
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
enum WatchTarget {
    Scripts(PathBuf),
    Include(PathBuf),
    Assets(AssetInput, AssetFilter),
}

impl WatchTarget {
    fn root(&self) -> &Path {
        match self {
            WatchTarget::Scripts(root) | WatchTarget::Include(root) => root,
            WatchTarget::Assets(asset, _) => &asset.dir,
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        let extension = path.extension().and_then(|ext| ext.to_str());
        match self {
            WatchTarget::Scripts(_) => extension == Some(SCRIPT_EXT),
            WatchTarget::Include(_) => extension == Some(INCLUDE_EXT),
            WatchTarget::Assets(..) => true,
        }
    }
}

/// Long-running session that recompiles and re-mirrors files as they change.
///
/// Roots missing at start are polled for and watched once they appear; the
/// session only ends through its [`StopHandle`].
pub struct WatchSession {
    builder: Builder,
    options: BuildOptions,
    targets: Vec<WatchTarget>,
    watchers: Vec<RecommendedWatcher>,
    pending: Vec<PathBuf>,
    sender: Sender<notify::Result<Event>>,
    events: Receiver<notify::Result<Event>>,
    stop: StopHandle,
}

impl WatchSession {
    /// Install one recursive watcher per script, include and asset root
    pub fn start(mut builder: Builder, options: BuildOptions) -> Result<Self> {
        if !options.no_cache {
            builder.refresh_include_fingerprint();
        }

        let config = builder.config();
        let mut targets: Vec<WatchTarget> = config
            .input
            .scripts
            .iter()
            .cloned()
            .map(WatchTarget::Scripts)
            .chain(config.input.include.iter().cloned().map(WatchTarget::Include))
            .collect();
        for asset in &config.input.assets {
            targets.push(WatchTarget::Assets(asset.clone(), AssetFilter::new(&asset.filter)?));
        }

        let mut roots: Vec<PathBuf> = Vec::new();
        for target in &targets {
            if !roots.iter().any(|root| root == target.root()) {
                roots.push(target.root().to_path_buf());
            }
        }

        let (sender, events) = channel();
        let mut session = Self {
            builder,
            options,
            targets,
            watchers: Vec::new(),
            pending: Vec::new(),
            sender,
            events,
            stop: StopHandle::new(),
        };

        for root in roots {
            if root.is_dir() {
                session.watch_root(&root)?;
            } else {
                warn!("Watch root {} does not exist yet", root.display());
                session.pending.push(root);
            }
        }

        Ok(session)
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn builder(&self) -> &Builder {
        &self.builder
    }

    /// Handle events until the stop handle fires
    pub fn run(mut self) -> Result<()> {
        info!("Watching for changes...");

        while !self.stop.is_stopped() {
            let mut changes = ChangeSet::default();
            let attached = self.attach_pending();

            if attached.is_empty() {
                match self.events.recv_timeout(POLL_INTERVAL) {
                    Ok(event) => collect_changes(event, &mut changes),
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }

            self.settle(&mut changes);

            // Files written into a new root before its watcher existed
            for root in &attached {
                match find_files(root, None) {
                    Ok(files) => changes.extend(files.into_iter().map(|relative| root.join(relative))),
                    Err(e) => error!("{}", e),
                }
            }

            if !changes.is_empty() {
                self.handle_changes(changes);
            }
        }

        info!("Watch stopped");
        Ok(())
    }

    /// Dispatch a batch of changed files to every target whose root holds them.
    ///
    /// Handler errors are logged. The include fingerprint is refreshed at
    /// most once between script compiles. Returns how many scripts were
    /// compiled.
    pub fn handle_changes(&mut self, paths: impl IntoIterator<Item = PathBuf>) -> usize {
        let Self {
            builder,
            options,
            targets,
            ..
        } = self;
        let options = *options;

        let mut compiled = 0;
        let mut includes_changed = false;

        for path in paths {
            if !path.is_file() {
                continue;
            }

            for target in targets.iter() {
                if !target.accepts(&path) {
                    continue;
                }
                let Some(relative) = relative_to(target.root(), &path) else {
                    continue;
                };

                let result = match target {
                    WatchTarget::Scripts(root) => {
                        if includes_changed && !options.no_cache {
                            builder.refresh_include_fingerprint();
                            includes_changed = false;
                        }
                        compiled += 1;
                        let job = CompileJob::new(root, relative, options);
                        builder.compile_one(&job).map(|_| ())
                    }
                    WatchTarget::Include(root) => {
                        includes_changed = true;
                        builder.update_include(root, &path)
                    }
                    WatchTarget::Assets(asset, filter) => {
                        builder.mirror_asset(asset, filter, &path).map(|_| ())
                    }
                };

                if let Err(e) = result {
                    error!("{}", e);
                }
            }
        }

        if includes_changed && !options.no_cache {
            builder.refresh_include_fingerprint();
        }

        if compiled > 0 && !options.no_cache {
            if let Err(e) = builder.save_cache() {
                warn!("Failed to save cache: {}", e);
            }
        }

        compiled
    }

    fn watch_root(&mut self, root: &Path) -> Result<()> {
        let sender = self.sender.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = sender.send(res);
        })?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        debug!("Watching {}", root.display());

        self.watchers.push(watcher);
        Ok(())
    }

    /// Watch every pending root that exists by now; returns the new ones
    fn attach_pending(&mut self) -> Vec<PathBuf> {
        let (ready, waiting): (Vec<PathBuf>, Vec<PathBuf>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|root| root.is_dir());
        self.pending = waiting;

        let mut attached = Vec::new();
        for root in ready {
            match self.watch_root(&root) {
                Ok(()) => {
                    info!("Watch root appeared: {}", root.display());
                    attached.push(root);
                }
                Err(e) => error!("Failed to watch {}: {}", root.display(), e),
            }
        }

        attached
    }

    fn settle(&self, changes: &mut ChangeSet) {
        let deadline = Instant::now() + SETTLE_WINDOW;
        while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            match self.events.recv_timeout(remaining) {
                Ok(event) => collect_changes(event, changes),
                Err(_) => break,
            }
        }
    }
}

fn collect_changes(event: notify::Result<Event>, changes: &mut ChangeSet) {
    let event = match event {
        Ok(event) => event,
        Err(e) => {
            warn!("Watch error: {}", e);
            return;
        }
    };

    let relevant = matches!(
        event.kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Any)
            | EventKind::Modify(ModifyKind::Name(RenameMode::To))
    );

    if relevant {
        changes.extend(event.paths);
    }
}
