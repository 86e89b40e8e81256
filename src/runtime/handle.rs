use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use hashbrown::HashMap;
use thiserror::Error;
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinSet,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

use crate::{
    aggregate::{self, RecencyWindow, latest_across},
    remote::{JudgeClient, RemoteError},
    stats::{DailyStatus, RecentProblem, UserStats},
    store::{StoreChange, StoreError, TrackedStore},
    types::{FilterMode, Generation, RefreshState, UnixSeconds, Username},
};

use super::events::WatchEvent;

/// Failures surfaced by the runtime's public operations.
///
/// Every operation resolves to a terminal state; no failure leaves a
/// username stuck in `Loading`.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Empty or whitespace-only username on add.
    #[error("username must not be empty")]
    EmptyUsername,
    /// The username is already in the tracked set.
    #[error("{0} is already tracked")]
    AlreadyTracked(Username),
    /// The existence check did not confirm the account.
    ///
    /// Transport failure during the check reads the same way; see
    /// [`crate::remote::JudgeClient::user_exists`].
    #[error("no account found for {0}")]
    UserNotFound(Username),
    /// The username is not in the tracked set.
    #[error("{0} is not tracked")]
    NotTracked(Username),
    /// Attempted removal of the protected own-identity username.
    #[error("{0} is your own account and cannot be removed")]
    ProtectedUser(Username),
    /// A refresh for this username is already in flight.
    #[error("a refresh for {0} is already in flight")]
    RefreshInFlight(Username),
    /// Local persistence failed; the operation was rolled back.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A remote query failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),
    /// The runtime loop is gone.
    #[error("runtime channel closed")]
    ChannelClosed,
}

/// Runtime tuning knobs.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Period between automatic refresh cycles.
    pub refresh_interval: Duration,
    /// How many recent submissions to request per user.
    pub recent_fetch_limit: u32,
    /// How many recent problems the display projection keeps.
    pub display_limit: usize,
    /// Command channel capacity.
    pub command_queue_bound: usize,
    /// Event broadcast capacity.
    pub event_queue_bound: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(600),
            recent_fetch_limit: 100,
            display_limit: 3,
            command_queue_bound: 64,
            event_queue_bound: 256,
        }
    }
}

/// Result of a successful `add_user`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Tracked and the first stats snapshot committed.
    Added,
    /// Tracked, but the first stats fetch failed; stats arrive with a
    /// later refresh.
    AddedStatsPending,
}

/// Settled refresh cycle summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Generation of the cycle that produced this report.
    pub generation: Generation,
    /// Usernames whose snapshots committed.
    pub succeeded: Vec<Username>,
    /// Usernames whose refresh failed.
    pub failed: Vec<Username>,
}

/// One tracked username as the presentation layer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardEntry {
    /// The tracked username.
    pub username: Username,
    /// Current refresh state.
    pub state: RefreshState,
    /// Latest committed snapshot, possibly stale after a failed refresh.
    pub stats: Option<UserStats>,
}

/// Point-in-time view of everything the runtime owns.
///
/// Entries are ordered for display: the own-identity username first,
/// then `recent_solved` descending, ties by username ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSnapshot {
    /// Tracked usernames in display order.
    pub entries: Vec<DashboardEntry>,
    /// Active recency filter.
    pub filter_mode: FilterMode,
    /// True while any username is loading.
    pub is_loading: bool,
    /// When the next periodic cycle is due; `None` before the first
    /// cycle completes.
    pub next_refresh_at: Option<UnixSeconds>,
}

impl DashboardSnapshot {
    /// Cross-user feed of the newest solves, at most `limit` entries.
    pub fn latest_feed(&self, limit: usize) -> Vec<(Username, RecentProblem)> {
        latest_across(
            self.entries
                .iter()
                .filter_map(|e| e.stats.as_ref().map(|s| (e.username.as_str(), s))),
            limit,
        )
    }
}

/// Cloneable handle to the runtime loop.
pub struct WatcherHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<WatchEvent>,
}

impl Clone for WatcherHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    AddUser {
        username: Username,
        resp: oneshot::Sender<Result<AddOutcome, RuntimeError>>,
    },
    RemoveUser {
        username: Username,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    ReloadAll {
        resp: oneshot::Sender<CycleReport>,
    },
    RetryUser {
        username: Username,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    SetFilterMode {
        mode: FilterMode,
        resp: oneshot::Sender<Result<bool, RuntimeError>>,
    },
    Snapshot {
        resp: oneshot::Sender<DashboardSnapshot>,
    },
    Daily {
        resp: oneshot::Sender<Result<DailyStatus, RuntimeError>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

struct RefreshOutcome {
    username: Username,
    generation: Generation,
    cycle: bool,
    result: Result<UserStats, RemoteError>,
    add_resp: Option<oneshot::Sender<Result<AddOutcome, RuntimeError>>>,
}

/// Messages spawned tasks send back into the loop.
enum LoopMsg {
    Refresh(RefreshOutcome),
    AddValidated {
        username: Username,
        exists: bool,
        resp: oneshot::Sender<Result<AddOutcome, RuntimeError>>,
    },
}

/// Spawns the single-writer runtime loop and returns its handle.
///
/// The loop owns the stats and refresh-state maps plus the in-memory
/// tracked sequence; the injected `store` is the persistence authority
/// and external writes to it (e.g. the sign-in merge) are re-derived via
/// its change broadcast. The first cycle fires as soon as the tracked
/// set is non-empty.
pub fn spawn_watcher<C: JudgeClient>(
    store: TrackedStore,
    client: C,
    config: RuntimeConfig,
) -> WatcherHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound);
    let (events_tx, _) = broadcast::channel::<WatchEvent>(config.event_queue_bound);
    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<LoopMsg>();
    let mut store_rx = store.subscribe();

    let events_loop = events_tx.clone();
    tokio::spawn(async move {
        let tracked = store.tracked_users().unwrap_or_else(|err| {
            warn!(%err, "tracked list unreadable at startup, starting empty");
            Vec::new()
        });
        let filter = store.filter_mode().unwrap_or_else(|err| {
            warn!(%err, "filter mode unreadable at startup, using default");
            FilterMode::default()
        });

        let mut watcher = Watcher {
            store,
            client: Arc::new(client),
            config,
            tracked,
            stats: HashMap::new(),
            states: HashMap::new(),
            filter,
            generation: 0,
            cycle_pending: 0,
            cycle_succeeded: Vec::new(),
            cycle_failed: Vec::new(),
            cycle_waiters: Vec::new(),
            // In the past, so the first armed poll starts a cycle.
            deadline: Instant::now(),
            next_refresh_unix: None,
            events_tx: events_loop,
            msg_tx,
        };

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break; };
                    if watcher.handle_command(cmd) {
                        break;
                    }
                }
                Some(msg) = msg_rx.recv() => {
                    watcher.handle_msg(msg);
                }
                change = store_rx.recv() => {
                    watcher.handle_store_change(change);
                }
                _ = tokio::time::sleep_until(watcher.deadline), if watcher.timer_armed() => {
                    debug!("periodic refresh due");
                    watcher.start_cycle();
                }
            }
        }
    });

    WatcherHandle { cmd_tx, events_tx }
}

impl WatcherHandle {
    /// Subscribes to the runtime event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<WatchEvent> {
        self.events_tx.subscribe()
    }

    /// Validates and tracks `username`, then fetches its first snapshot.
    ///
    /// Resolves once the first fetch settles; a persistence success with
    /// a fetch failure reports [`AddOutcome::AddedStatsPending`] rather
    /// than rolling back.
    pub async fn add_user(&self, username: impl Into<Username>) -> Result<AddOutcome, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::AddUser {
                username: username.into(),
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Removes `username` from the tracked set and discards its state.
    ///
    /// Rejected for the protected own-identity username.
    pub async fn remove_user(&self, username: impl Into<Username>) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::RemoveUser {
                username: username.into(),
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Starts a refresh cycle for the whole tracked set and waits for it
    /// to settle. A cycle superseded by a newer one resolves with the
    /// newer cycle's report.
    pub async fn reload_all(&self) -> Result<CycleReport, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ReloadAll { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Re-fetches one username. Usable only when that username is not
    /// already loading; completion surfaces via events and snapshots.
    pub async fn retry_user(&self, username: impl Into<Username>) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::RetryUser {
                username: username.into(),
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Switches the recency filter. A change triggers an immediate full
    /// reload (not a local re-filter). Returns whether anything changed.
    pub async fn set_filter_mode(&self, mode: FilterMode) -> Result<bool, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SetFilterMode { mode, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Point-in-time view of the tracked set in display order.
    pub async fn snapshot(&self) -> Result<DashboardSnapshot, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Snapshot { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Fetches the daily challenge and each tracked user's solved flag.
    pub async fn daily_status(&self) -> Result<DailyStatus, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Daily { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Stops the runtime loop. In-flight refresh tasks finish but their
    /// outcomes go nowhere.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

struct Watcher<C: JudgeClient> {
    store: TrackedStore,
    client: Arc<C>,
    config: RuntimeConfig,
    tracked: Vec<Username>,
    stats: HashMap<Username, UserStats>,
    states: HashMap<Username, RefreshState>,
    filter: FilterMode,
    generation: Generation,
    cycle_pending: usize,
    cycle_succeeded: Vec<Username>,
    cycle_failed: Vec<Username>,
    cycle_waiters: Vec<oneshot::Sender<CycleReport>>,
    deadline: Instant,
    next_refresh_unix: Option<UnixSeconds>,
    events_tx: broadcast::Sender<WatchEvent>,
    msg_tx: mpsc::UnboundedSender<LoopMsg>,
}

impl<C: JudgeClient> Watcher<C> {
    fn timer_armed(&self) -> bool {
        !self.tracked.is_empty() && self.cycle_pending == 0
    }

    /// Returns true when the loop should stop.
    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::AddUser { username, resp } => {
                self.handle_add(username, resp);
            }
            Command::RemoveUser { username, resp } => {
                let _ = resp.send(self.handle_remove(&username));
            }
            Command::ReloadAll { resp } => {
                self.cycle_waiters.push(resp);
                self.start_cycle();
            }
            Command::RetryUser { username, resp } => {
                let _ = resp.send(self.handle_retry(username));
            }
            Command::SetFilterMode { mode, resp } => {
                let _ = resp.send(self.handle_set_filter(mode));
            }
            Command::Snapshot { resp } => {
                let _ = resp.send(self.snapshot());
            }
            Command::Daily { resp } => {
                self.spawn_daily(resp);
            }
            Command::Shutdown { resp } => {
                let _ = resp.send(());
                return true;
            }
        }
        false
    }

    fn handle_add(
        &mut self,
        username: Username,
        resp: oneshot::Sender<Result<AddOutcome, RuntimeError>>,
    ) {
        let username = username.trim().to_string();
        if username.is_empty() {
            let _ = resp.send(Err(RuntimeError::EmptyUsername));
            return;
        }
        if self.tracked.contains(&username) {
            let _ = resp.send(Err(RuntimeError::AlreadyTracked(username)));
            return;
        }

        // The existence check is a remote call; it must not stall the
        // loop. Validation completes via an AddValidated message.
        let client = Arc::clone(&self.client);
        let msg_tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let exists = client.user_exists(&username).await;
            let _ = msg_tx.send(LoopMsg::AddValidated {
                username,
                exists,
                resp,
            });
        });
    }

    fn handle_add_validated(
        &mut self,
        username: Username,
        exists: bool,
        resp: oneshot::Sender<Result<AddOutcome, RuntimeError>>,
    ) {
        // A transport failure reads as "not found"; the check is
        // best-effort by design.
        if !exists {
            let _ = resp.send(Err(RuntimeError::UserNotFound(username)));
            return;
        }
        // The tracked set may have changed while the check was in flight.
        if self.tracked.contains(&username) {
            let _ = resp.send(Err(RuntimeError::AlreadyTracked(username)));
            return;
        }

        let mut updated = self.tracked.clone();
        updated.push(username.clone());
        if let Err(err) = self.store.set_tracked_users(&updated) {
            // Persistence is the authority; nothing was tracked.
            let _ = resp.send(Err(err.into()));
            return;
        }

        self.tracked = updated;
        self.states.insert(username.clone(), RefreshState::Loading);
        info!(%username, "tracking new user");
        let _ = self.events_tx.send(WatchEvent::UserAdded {
            username: username.clone(),
        });
        self.reset_deadline();
        self.spawn_refresh(username, false, Some(resp));
    }

    fn handle_remove(&mut self, username: &str) -> Result<(), RuntimeError> {
        if let Some(own) = self.store.own_identity()?
            && own == username
        {
            return Err(RuntimeError::ProtectedUser(own));
        }
        if !self.tracked.iter().any(|u| u == username) {
            return Err(RuntimeError::NotTracked(username.to_string()));
        }

        let updated: Vec<Username> = self
            .tracked
            .iter()
            .filter(|u| u.as_str() != username)
            .cloned()
            .collect();
        self.store.set_tracked_users(&updated)?;

        self.tracked = updated;
        self.stats.remove(username);
        self.states.remove(username);
        info!(%username, "stopped tracking user");
        let _ = self.events_tx.send(WatchEvent::UserRemoved {
            username: username.to_string(),
        });
        self.reset_deadline();
        Ok(())
    }

    fn handle_retry(&mut self, username: Username) -> Result<(), RuntimeError> {
        if !self.tracked.contains(&username) {
            return Err(RuntimeError::NotTracked(username));
        }
        if self.states.get(&username) == Some(&RefreshState::Loading) {
            return Err(RuntimeError::RefreshInFlight(username));
        }
        self.states.insert(username.clone(), RefreshState::Loading);
        self.spawn_refresh(username, false, None);
        Ok(())
    }

    fn handle_set_filter(&mut self, mode: FilterMode) -> Result<bool, RuntimeError> {
        if mode == self.filter {
            return Ok(false);
        }
        self.store.set_filter_mode(mode)?;
        self.filter = mode;
        let _ = self.events_tx.send(WatchEvent::FilterModeChanged { mode });
        // The window changes which submissions survive, so this is a
        // full re-aggregation, not a local re-filter.
        self.start_cycle();
        Ok(true)
    }

    fn start_cycle(&mut self) {
        self.generation += 1;
        self.cycle_succeeded.clear();
        self.cycle_failed.clear();
        self.cycle_pending = self.tracked.len();
        let _ = self.events_tx.send(WatchEvent::CycleStarted {
            generation: self.generation,
            users: self.tracked.len(),
        });

        if self.tracked.is_empty() {
            self.finish_cycle();
            return;
        }
        for username in self.tracked.clone() {
            self.states
                .insert(username.clone(), RefreshState::Loading);
            self.spawn_refresh(username, true, None);
        }
    }

    fn finish_cycle(&mut self) {
        self.reset_deadline();
        let report = CycleReport {
            generation: self.generation,
            succeeded: std::mem::take(&mut self.cycle_succeeded),
            failed: std::mem::take(&mut self.cycle_failed),
        };
        let _ = self.events_tx.send(WatchEvent::CycleCompleted {
            generation: report.generation,
            succeeded: report.succeeded.len(),
            failed: report.failed.len(),
            next_refresh_at: self.next_refresh_unix.unwrap_or_default(),
        });
        for waiter in self.cycle_waiters.drain(..) {
            let _ = waiter.send(report.clone());
        }
    }

    fn handle_msg(&mut self, msg: LoopMsg) {
        match msg {
            LoopMsg::Refresh(outcome) => self.handle_outcome(outcome),
            LoopMsg::AddValidated {
                username,
                exists,
                resp,
            } => self.handle_add_validated(username, exists, resp),
        }
    }

    fn handle_outcome(&mut self, outcome: RefreshOutcome) {
        let current = outcome.generation == self.generation;
        let tracked = self.tracked.contains(&outcome.username);
        let mut committed = false;

        if current && tracked {
            match &outcome.result {
                Ok(stats) => {
                    self.stats.insert(outcome.username.clone(), stats.clone());
                    self.states
                        .insert(outcome.username.clone(), RefreshState::Idle);
                    let _ = self.events_tx.send(WatchEvent::UserRefreshed {
                        username: outcome.username.clone(),
                    });
                    committed = true;
                }
                Err(err) => {
                    // Stale-data-over-no-data: prior stats stay put.
                    warn!(username = %outcome.username, %err, "stats refresh failed");
                    self.states
                        .insert(outcome.username.clone(), RefreshState::Error);
                    let _ = self.events_tx.send(WatchEvent::UserRefreshFailed {
                        username: outcome.username.clone(),
                        error: err.to_string(),
                    });
                }
            }
        } else {
            debug!(
                username = %outcome.username,
                generation = outcome.generation,
                current = self.generation,
                "discarding superseded refresh outcome"
            );
        }

        // Cycle accounting follows the generation, not the tracked set: a
        // username removed mid-cycle still settles its slot, otherwise the
        // cycle never finishes and the periodic timer stays disarmed.
        if current && outcome.cycle {
            if tracked {
                match outcome.result.is_ok() {
                    true => self.cycle_succeeded.push(outcome.username.clone()),
                    false => self.cycle_failed.push(outcome.username.clone()),
                }
            }
            self.cycle_pending = self.cycle_pending.saturating_sub(1);
            if self.cycle_pending == 0 {
                self.finish_cycle();
            }
        }

        if let Some(resp) = outcome.add_resp {
            let reply = if committed {
                AddOutcome::Added
            } else {
                AddOutcome::AddedStatsPending
            };
            let _ = resp.send(Ok(reply));
        }
    }

    fn handle_store_change(&mut self, change: Result<StoreChange, broadcast::error::RecvError>) {
        match change {
            Ok(StoreChange::TrackedUsers) => self.rederive_tracked(),
            Ok(StoreChange::FilterMode) => self.rederive_filter(),
            // Own identity is read live at each use site.
            Ok(StoreChange::OwnIdentity) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "store change stream lagged, re-deriving");
                self.rederive_tracked();
                self.rederive_filter();
            }
            Err(broadcast::error::RecvError::Closed) => {}
        }
    }

    fn rederive_tracked(&mut self) {
        let list = match self.store.tracked_users() {
            Ok(list) => list,
            Err(err) => {
                warn!(%err, "tracked list unreadable after store change");
                return;
            }
        };
        // Our own writes land here too; only external changes matter.
        if list == self.tracked {
            return;
        }

        self.stats.retain(|name, _| list.contains(name));
        self.states.retain(|name, _| list.contains(name));
        self.tracked = list;
        info!(users = self.tracked.len(), "tracked list replaced from store");
        let _ = self.events_tx.send(WatchEvent::TrackedListReplaced {
            users: self.tracked.len(),
        });
        self.start_cycle();
    }

    fn rederive_filter(&mut self) {
        let mode = match self.store.filter_mode() {
            Ok(mode) => mode,
            Err(err) => {
                warn!(%err, "filter mode unreadable after store change");
                return;
            }
        };
        if mode != self.filter {
            self.filter = mode;
            let _ = self.events_tx.send(WatchEvent::FilterModeChanged { mode });
            self.start_cycle();
        }
    }

    fn spawn_refresh(
        &self,
        username: Username,
        cycle: bool,
        add_resp: Option<oneshot::Sender<Result<AddOutcome, RuntimeError>>>,
    ) {
        let client = Arc::clone(&self.client);
        let msg_tx = self.msg_tx.clone();
        let generation = self.generation;
        let window = RecencyWindow::for_mode(self.filter, now_unix());
        let fetch_limit = self.config.recent_fetch_limit;
        let display_limit = self.config.display_limit;

        tokio::spawn(async move {
            let result =
                aggregate::fetch_user_stats(client, &username, window, fetch_limit, display_limit)
                    .await;
            let _ = msg_tx.send(LoopMsg::Refresh(RefreshOutcome {
                username,
                generation,
                cycle,
                result,
                add_resp,
            }));
        });
    }

    fn spawn_daily(&self, resp: oneshot::Sender<Result<DailyStatus, RuntimeError>>) {
        let client = Arc::clone(&self.client);
        let tracked = self.tracked.clone();
        let fetch_limit = self.config.recent_fetch_limit;

        tokio::spawn(async move {
            let reply = match client.daily_challenge().await {
                Ok(challenge) => {
                    let mut checks = JoinSet::new();
                    for (idx, username) in tracked.iter().cloned().enumerate() {
                        let client = Arc::clone(&client);
                        let slug = challenge.title_slug.clone();
                        checks.spawn(async move {
                            let solved =
                                aggregate::check_solved(&*client, &username, &slug, fetch_limit)
                                    .await;
                            (idx, solved)
                        });
                    }

                    let mut solved: Vec<(Username, bool)> =
                        tracked.into_iter().map(|u| (u, false)).collect();
                    while let Some(joined) = checks.join_next().await {
                        if let Ok((idx, flag)) = joined {
                            solved[idx].1 = flag;
                        }
                    }
                    Ok(DailyStatus { challenge, solved })
                }
                Err(err) => Err(err.into()),
            };
            let _ = resp.send(reply);
        });
    }

    fn snapshot(&self) -> DashboardSnapshot {
        let own = self.store.own_identity().unwrap_or_else(|err| {
            warn!(%err, "own identity unreadable, ignoring pin");
            None
        });

        let mut entries: Vec<DashboardEntry> = self
            .tracked
            .iter()
            .map(|username| DashboardEntry {
                username: username.clone(),
                state: self.states.get(username).copied().unwrap_or_default(),
                stats: self.stats.get(username).cloned(),
            })
            .collect();

        entries.sort_by(|a, b| {
            let a_own = own.as_deref() == Some(a.username.as_str());
            let b_own = own.as_deref() == Some(b.username.as_str());
            let a_recent = a.stats.as_ref().map_or(0, |s| s.recent_solved);
            let b_recent = b.stats.as_ref().map_or(0, |s| s.recent_solved);
            b_own
                .cmp(&a_own)
                .then_with(|| b_recent.cmp(&a_recent))
                .then_with(|| a.username.cmp(&b.username))
        });

        DashboardSnapshot {
            entries,
            filter_mode: self.filter,
            is_loading: self
                .states
                .values()
                .any(|state| *state == RefreshState::Loading),
            next_refresh_at: self.next_refresh_unix,
        }
    }

    fn reset_deadline(&mut self) {
        self.deadline = Instant::now() + self.config.refresh_interval;
        self.next_refresh_unix = Some(now_unix() + self.config.refresh_interval.as_secs());
    }
}

fn now_unix() -> UnixSeconds {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
