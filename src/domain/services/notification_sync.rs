use crate::domain::{
    entities::{
        CreateNotificationRequest, Notification, NotificationId, NotificationPage,
        NotificationQuery, NotificationStats, UserId,
    },
    error::{DomainError, DomainResult},
    events::{DynEventPublisher, MutationKind, SyncEvent, SyncPhase},
    repositories::DynNotificationTransport,
    services::{
        background::PeriodicTask,
        mutation::{MutationOutcome, RollbackPolicy},
    },
};
use crate::infrastructure::config::SyncConfig;
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use moka::future::Cache;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use validator::Validate;

/// The materialized notification list and its loading flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncState {
    pub notifications: Vec<Notification>,
    pub current_page: u32,
    pub page_size: u32,
    pub has_more: bool,
    pub total_count: u64,
    pub is_loading: bool,
    pub is_refreshing: bool,
    pub is_loading_more: bool,
    pub last_error: Option<String>,
    pub phase: SyncPhase,
}

impl SyncState {
    fn empty(page_size: u32) -> Self {
        Self {
            notifications: Vec::new(),
            current_page: 0,
            page_size,
            has_more: false,
            total_count: 0,
            is_loading: false,
            is_refreshing: false,
            is_loading_more: false,
            last_error: None,
            phase: SyncPhase::Idle,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.is_loading || self.is_refreshing || self.is_loading_more
    }

    fn settle_phase(&mut self) {
        self.phase = if self.is_loading {
            SyncPhase::Loading
        } else if self.is_refreshing {
            SyncPhase::Refreshing
        } else if self.is_loading_more {
            SyncPhase::LoadingMore
        } else if self.current_page == 0 {
            SyncPhase::Idle
        } else {
            SyncPhase::Loaded
        };
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncSnapshot {
    pub user_id: Option<UserId>,
    pub state: SyncState,
    pub stats: NotificationStats,
}

struct EngineInner {
    user_id: Option<UserId>,
    state: SyncState,
    stats: NotificationStats,
    stats_loaded: bool,
    /// Bumped whenever the list is replaced wholesale.
    generation: u64,
    /// Bumped whenever `stats` is replaced by an authoritative recompute.
    stats_epoch: u64,
}

type PageFlight = Shared<BoxFuture<'static, DomainResult<NotificationPage>>>;

struct PendingPage {
    id: u64,
    user_id: UserId,
    page_size: u32,
    future: PageFlight,
}

#[derive(Default)]
struct PageSlot {
    next_id: u64,
    pending: Option<PendingPage>,
}

enum FetchMode {
    Load,
    Refresh,
}

/// Exclusive owner of one user's notification list.
///
/// Consumers read [`SyncSnapshot`]s and issue commands; all writes go through
/// this type. Transport failures never escape: they land in
/// `SyncState::last_error` or in a [`MutationOutcome`].
pub struct NotificationSyncEngine {
    transport: DynNotificationTransport,
    publisher: DynEventPublisher,
    config: SyncConfig,
    inner: Mutex<EngineInner>,
    page_one: Mutex<PageSlot>,
    stats_cache: Cache<UserId, NotificationStats>,
    auto_refresh: Mutex<Option<PeriodicTask>>,
    consecutive_failures: AtomicU32,
}

impl std::fmt::Debug for NotificationSyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("NotificationSyncEngine")
            .field("user_id", &inner.user_id)
            .field("phase", &inner.state.phase)
            .field("notifications", &inner.state.notifications.len())
            .finish()
    }
}

impl NotificationSyncEngine {
    pub fn new(
        transport: DynNotificationTransport,
        publisher: DynEventPublisher,
        config: SyncConfig,
    ) -> Self {
        let stats_cache = Cache::builder()
            .max_capacity(config.stats_cache_capacity)
            .time_to_live(config.stats_cache_ttl)
            .build();

        Self {
            transport,
            publisher,
            inner: Mutex::new(EngineInner {
                user_id: None,
                state: SyncState::empty(config.page_size),
                stats: NotificationStats::default(),
                stats_loaded: false,
                generation: 0,
                stats_epoch: 0,
            }),
            page_one: Mutex::new(PageSlot::default()),
            stats_cache,
            auto_refresh: Mutex::new(None),
            consecutive_failures: AtomicU32::new(0),
            config,
        }
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.inner.lock().user_id
    }

    /// Binds the engine to `user_id`, discarding any other user's list.
    pub async fn set_user(&self, user_id: UserId) {
        {
            let mut inner = self.inner.lock();
            if inner.user_id == Some(user_id) {
                return;
            }
            Self::reset(&mut inner, Some(user_id), self.config.page_size);
        }
        self.page_one.lock().pending = None;
        info!("Notification sync bound to user {}", user_id);
        self.publish(SyncEvent::state_changed(SyncPhase::Idle)).await;
    }

    /// Logout: stops auto-refresh and forgets the list and counters.
    pub async fn clear(&self) {
        self.stop_auto_refresh();
        let previous = {
            let mut inner = self.inner.lock();
            let previous = inner.user_id;
            Self::reset(&mut inner, None, self.config.page_size);
            previous
        };
        self.page_one.lock().pending = None;
        if let Some(user_id) = previous {
            self.stats_cache.invalidate(&user_id).await;
            info!("Cleared notification state for user {}", user_id);
        }
        self.consecutive_failures.store(0, Ordering::SeqCst);
        self.publish(SyncEvent::state_changed(SyncPhase::Idle)).await;
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        let inner = self.inner.lock();
        SyncSnapshot {
            user_id: inner.user_id,
            state: inner.state.clone(),
            stats: inner.stats.clone(),
        }
    }

    /// Live counters, including optimistic adjustments.
    pub fn stats(&self) -> NotificationStats {
        self.inner.lock().stats.clone()
    }

    pub fn unread_count(&self) -> u64 {
        self.inner.lock().stats.unread_count
    }

    /// Replaces the list with the requested page. Page 1 requests issued
    /// while another is pending share its result.
    pub async fn fetch(&self, query: NotificationQuery) -> bool {
        self.load(query, FetchMode::Load).await
    }

    /// Page 1 again plus a forced recompute of the authoritative counters.
    pub async fn refresh(&self) -> bool {
        let page_size = self.inner.lock().state.page_size;
        self.load(NotificationQuery::first_page(page_size), FetchMode::Refresh)
            .await
    }

    /// Appends the next page. Returns `false` without side effects when
    /// nothing is loaded yet, there is no next page, or a fetch is running.
    pub async fn load_more(&self) -> bool {
        let (user_id, next_page, page_size, generation) = {
            let mut inner = self.inner.lock();
            let Some(user_id) = inner.user_id else {
                return false;
            };
            let generation = inner.generation;
            let state = &mut inner.state;
            if state.current_page == 0 || !state.has_more || state.is_busy() {
                debug!(
                    "Rejecting load_more (page {}, has_more {}, busy {})",
                    state.current_page,
                    state.has_more,
                    state.is_busy()
                );
                return false;
            }
            state.is_loading_more = true;
            state.settle_phase();
            (user_id, state.current_page + 1, state.page_size, generation)
        };
        self.publish(SyncEvent::state_changed(SyncPhase::LoadingMore))
            .await;

        let result = self
            .transport
            .fetch_notifications(user_id, next_page, page_size)
            .await;

        let (appended, phase) = {
            let mut inner = self.inner.lock();
            if inner.user_id != Some(user_id) {
                return false;
            }
            let stale = inner.generation != generation;
            let state = &mut inner.state;
            state.is_loading_more = false;

            let appended = if stale {
                debug!("Discarding page {} fetched before a reload", next_page);
                false
            } else {
                match result {
                    Ok(page) => {
                        merge_by_id(&mut state.notifications, page.notifications);
                        state.current_page = next_page;
                        state.has_more = page.has_more;
                        state.total_count = page.total_count;
                        state.last_error = None;
                        true
                    }
                    Err(e) => {
                        warn!("Failed to load page {}: {}", next_page, e);
                        state.last_error = Some(e.to_string());
                        false
                    }
                }
            };
            state.settle_phase();
            if !appended && !stale && state.last_error.is_some() {
                state.phase = SyncPhase::Errored;
            }
            (appended, state.phase)
        };
        self.publish(SyncEvent::state_changed(phase)).await;
        appended
    }

    /// Optimistically marks one notification read; a failed server write
    /// restores the previous read flag and counters.
    pub async fn mark_as_read(&self, id: NotificationId) -> MutationOutcome {
        let undo = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            match inner.state.notifications.iter_mut().find(|n| n.id == id) {
                Some(notification) if notification.read_status => {
                    return MutationOutcome::Applied;
                }
                Some(notification) => {
                    notification.read_status = true;
                    Some(ReadUndo {
                        id,
                        counted: inner.stats.record_read(),
                        stats_epoch: inner.stats_epoch,
                    })
                }
                None => None,
            }
        };
        if undo.is_some() {
            self.publish_stats().await;
        }

        match self.transport.mark_read(id).await {
            Ok(()) => {
                self.record_success();
                self.invalidate_stats_cache().await;
                MutationOutcome::Applied
            }
            Err(e) => {
                self.settle_failure(MutationKind::MarkRead, vec![id], undo, e)
                    .await
            }
        }
    }

    /// Optimistically marks everything read. Partial server failures are
    /// left for the next refresh to reconcile.
    ///
    /// Without a bulk endpoint only loaded items can be marked, so unread
    /// items on unloaded pages leave the outcome `Diverged` with no failed ids.
    pub async fn mark_all_as_read(&self) -> MutationOutcome {
        let (user_id, unread_ids, had_unread, unread_before) = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            let Some(user_id) = inner.user_id else {
                return MutationOutcome::Rejected {
                    reason: "No active user".to_string(),
                };
            };
            let mut unread_ids = Vec::new();
            for notification in inner.state.notifications.iter_mut() {
                if notification.is_unread() {
                    notification.read_status = true;
                    unread_ids.push(notification.id);
                }
            }
            let unread_before = inner.stats.unread_count;
            let had_unread = unread_before > 0 || !unread_ids.is_empty();
            inner.stats.record_all_read();
            (user_id, unread_ids, had_unread, unread_before)
        };
        if !had_unread {
            return MutationOutcome::Applied;
        }
        self.publish_stats().await;

        let bulk = self.transport.supports_bulk_mark_read();
        let failure = if bulk {
            self.transport
                .mark_all_read(user_id)
                .await
                .err()
                .map(|e| (unread_ids.clone(), e))
        } else {
            let calls = unread_ids.iter().map(|id| self.transport.mark_read(*id));
            let results = join_all(calls).await;
            let mut failed_ids = Vec::new();
            let mut first_error = None;
            for (id, result) in unread_ids.iter().zip(results) {
                if let Err(e) = result {
                    failed_ids.push(*id);
                    first_error.get_or_insert(e);
                }
            }
            first_error.map(|e| (failed_ids, e))
        };

        self.invalidate_stats_cache().await;
        let uncovered = if bulk {
            0
        } else {
            unread_before.saturating_sub(unread_ids.len() as u64)
        };
        match failure {
            None if uncovered > 0 => {
                self.record_success();
                let error = format!("{} unread notifications are not loaded", uncovered);
                debug!("Mark all read for user {}: {}", user_id, error);
                self.publish(SyncEvent::MutationDiverged {
                    kind: MutationKind::MarkAllRead,
                    failed_ids: Vec::new(),
                    error: error.clone(),
                })
                .await;
                MutationOutcome::Diverged {
                    failed_ids: Vec::new(),
                    error,
                }
            }
            None => {
                self.record_success();
                MutationOutcome::Applied
            }
            Some((failed_ids, e)) => {
                self.settle_failure(MutationKind::MarkAllRead, failed_ids, None, e)
                    .await
            }
        }
    }

    /// Optimistically removes a notification. A failed delete is not
    /// restored locally.
    pub async fn delete_notification(&self, id: NotificationId) -> MutationOutcome {
        let removed = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            let position = inner.state.notifications.iter().position(|n| n.id == id);
            position.map(|index| {
                let notification = inner.state.notifications.remove(index);
                inner.stats.record_removed(&notification);
                inner.state.total_count = inner.state.total_count.saturating_sub(1);
                notification
            })
        };
        if removed.is_some() {
            self.publish_stats().await;
        }

        let result = self.transport.delete(id).await;
        self.invalidate_stats_cache().await;
        match result {
            Ok(()) => {
                self.record_success();
                MutationOutcome::Applied
            }
            Err(e) => {
                self.settle_failure(MutationKind::Delete, vec![id], None, e)
                    .await
            }
        }
    }

    /// Validates and sends a new notification. Does not touch the list.
    pub async fn create_notification(
        &self,
        request: CreateNotificationRequest,
    ) -> DomainResult<Notification> {
        request.validate()?;
        let user_id = request.user_id;
        let created = self.transport.create(request).await?;
        self.stats_cache.invalidate(&user_id).await;
        debug!("Created notification {} for user {}", created.id, user_id);
        Ok(created)
    }

    /// Authoritative counters for the current user, recomputed from the
    /// full per-user list (served from a short-lived cache).
    pub async fn get_stats(&self) -> NotificationStats {
        let Some(user_id) = self.current_user() else {
            return NotificationStats::default();
        };
        match self.recompute_stats(user_id, false).await {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Failed to recompute notification stats: {}", e);
                self.stats()
            }
        }
    }

    pub async fn get_unread_count(&self) -> u64 {
        self.get_stats().await.unread_count
    }

    /// Installs a timer calling [`refresh`](Self::refresh) every `interval`,
    /// replacing any running timer.
    pub fn start_auto_refresh(self: &Arc<Self>, interval: Duration) {
        let engine = Arc::downgrade(self);
        let task = PeriodicTask::spawn("notification-auto-refresh", interval, move || {
            let engine = engine.clone();
            async move {
                match engine.upgrade() {
                    Some(engine) => {
                        engine.refresh().await;
                        true
                    }
                    None => false,
                }
            }
        });

        if let Some(previous) = self.auto_refresh.lock().replace(task) {
            debug!("Replacing running {} timer", previous.name());
            previous.cancel();
        }
    }

    pub fn stop_auto_refresh(&self) {
        if let Some(task) = self.auto_refresh.lock().take() {
            task.cancel();
            info!("Notification auto-refresh stopped");
        }
    }

    pub fn is_auto_refreshing(&self) -> bool {
        self.auto_refresh.lock().is_some()
    }

    async fn load(&self, query: NotificationQuery, mode: FetchMode) -> bool {
        if let Err(errors) = query.validate() {
            let error = DomainError::from(errors);
            warn!("Rejected notification query: {}", error);
            self.inner.lock().state.last_error = Some(error.to_string());
            return false;
        }

        let (user_id, phase) = {
            let mut inner = self.inner.lock();
            let Some(user_id) = inner.user_id else {
                debug!("Fetch requested without an active user");
                return false;
            };
            match mode {
                FetchMode::Load => inner.state.is_loading = true,
                FetchMode::Refresh => inner.state.is_refreshing = true,
            }
            inner.state.settle_phase();
            (user_id, inner.state.phase)
        };
        self.publish(SyncEvent::state_changed(phase)).await;

        let result = if query.page == 1 {
            self.fetch_first_page(user_id, query.page_size).await
        } else {
            self.transport
                .fetch_notifications(user_id, query.page, query.page_size)
                .await
        };

        let (applied, needs_stats, phase) = {
            let mut inner = self.inner.lock();
            if inner.user_id != Some(user_id) {
                debug!("Dropping page for user {} after a user switch", user_id);
                return false;
            }
            match mode {
                FetchMode::Load => inner.state.is_loading = false,
                FetchMode::Refresh => inner.state.is_refreshing = false,
            }

            let applied = match result {
                Ok(page) => {
                    inner.generation += 1;
                    let state = &mut inner.state;
                    state.notifications.clear();
                    merge_by_id(&mut state.notifications, page.notifications);
                    state.current_page = query.page;
                    state.page_size = query.page_size;
                    state.has_more = page.has_more;
                    state.total_count = page.total_count;
                    state.last_error = None;
                    state.settle_phase();
                    true
                }
                Err(e) => {
                    warn!("Failed to fetch notifications for user {}: {}", user_id, e);
                    inner.state.last_error = Some(e.to_string());
                    inner.state.settle_phase();
                    if !inner.state.is_busy() {
                        inner.state.phase = SyncPhase::Errored;
                    }
                    false
                }
            };
            let needs_stats = matches!(mode, FetchMode::Refresh) || !inner.stats_loaded;
            (applied, needs_stats, inner.state.phase)
        };
        self.publish(SyncEvent::state_changed(phase)).await;

        if applied && needs_stats {
            let force = matches!(mode, FetchMode::Refresh);
            if let Err(e) = self.recompute_stats(user_id, force).await {
                warn!("Keeping previous notification stats: {}", e);
                self.derive_local_stats(user_id);
            }
        }
        applied
    }

    async fn fetch_first_page(
        &self,
        user_id: UserId,
        page_size: u32,
    ) -> DomainResult<NotificationPage> {
        let (flight_id, future) = {
            let mut slot = self.page_one.lock();
            let pending = slot
                .pending
                .as_ref()
                .filter(|p| p.user_id == user_id && p.page_size == page_size)
                .map(|p| (p.id, p.future.clone()));

            match pending {
                Some(joined) => {
                    debug!("Joining in-flight page 1 fetch for user {}", user_id);
                    joined
                }
                None => {
                    slot.next_id += 1;
                    let id = slot.next_id;
                    let transport = Arc::clone(&self.transport);
                    let future = async move {
                        transport.fetch_notifications(user_id, 1, page_size).await
                    }
                    .boxed()
                    .shared();
                    slot.pending = Some(PendingPage {
                        id,
                        user_id,
                        page_size,
                        future: future.clone(),
                    });
                    (id, future)
                }
            }
        };

        let result = future.await;

        let mut slot = self.page_one.lock();
        if slot.pending.as_ref().map(|p| p.id) == Some(flight_id) {
            slot.pending = None;
        }
        result
    }

    async fn recompute_stats(&self, user_id: UserId, force: bool) -> DomainResult<NotificationStats> {
        if force {
            self.stats_cache.invalidate(&user_id).await;
        }

        let stats = match self.stats_cache.get(&user_id).await {
            Some(stats) => stats,
            None => {
                let all = self.transport.fetch_all_for_user(user_id).await?;
                let stats = NotificationStats::from_notifications(&all);
                self.stats_cache.insert(user_id, stats.clone()).await;
                stats
            }
        };

        let applied = {
            let mut inner = self.inner.lock();
            if inner.user_id == Some(user_id) {
                inner.stats = stats.clone();
                inner.stats_loaded = true;
                inner.stats_epoch += 1;
                true
            } else {
                false
            }
        };
        if applied {
            self.publish_stats().await;
        }
        Ok(stats)
    }

    fn derive_local_stats(&self, user_id: UserId) {
        let mut inner = self.inner.lock();
        if inner.user_id == Some(user_id) && !inner.stats_loaded {
            inner.stats = NotificationStats::from_notifications(&inner.state.notifications);
        }
    }

    async fn invalidate_stats_cache(&self) {
        if let Some(user_id) = self.current_user() {
            self.stats_cache.invalidate(&user_id).await;
        }
    }

    async fn settle_failure(
        &self,
        kind: MutationKind,
        failed_ids: Vec<NotificationId>,
        undo: Option<ReadUndo>,
        error: DomainError,
    ) -> MutationOutcome {
        let message = error.to_string();
        self.record_failure(kind, &message).await;

        match kind.rollback_policy() {
            RollbackPolicy::Rollback => {
                if let Some(undo) = undo {
                    self.undo_read(undo);
                    self.publish_stats().await;
                }
                let notification_id = failed_ids.first().copied().unwrap_or_default();
                self.publish(SyncEvent::MutationRolledBack {
                    kind,
                    notification_id,
                    error: message.clone(),
                })
                .await;
                MutationOutcome::RolledBack { error: message }
            }
            RollbackPolicy::BestEffort | RollbackPolicy::AcceptDivergence => {
                self.publish(SyncEvent::MutationDiverged {
                    kind,
                    failed_ids: failed_ids.clone(),
                    error: message.clone(),
                })
                .await;
                MutationOutcome::Diverged {
                    failed_ids,
                    error: message,
                }
            }
        }
    }

    fn undo_read(&self, undo: ReadUndo) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if let Some(notification) = inner
            .state
            .notifications
            .iter_mut()
            .find(|n| n.id == undo.id && n.read_status)
        {
            notification.read_status = false;
        }
        // Counters replaced by a recompute already reflect the server.
        if undo.counted && inner.stats_epoch == undo.stats_epoch {
            inner.stats.record_unread();
        }
    }

    fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
    }

    async fn record_failure(&self, kind: MutationKind, message: &str) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        if failures >= self.config.repeated_failure_threshold {
            error!(
                "{:?} failed ({} consecutive failures): {}",
                kind, failures, message
            );
            self.publish(SyncEvent::RepeatedMutationFailure {
                failures,
                last_error: message.to_string(),
            })
            .await;
        } else {
            warn!("{:?} failed: {}", kind, message);
        }
    }

    async fn publish_stats(&self) {
        let (total_count, unread_count) = {
            let inner = self.inner.lock();
            (inner.stats.total_count, inner.stats.unread_count)
        };
        self.publish(SyncEvent::StatsUpdated {
            total_count,
            unread_count,
        })
        .await;
    }

    async fn publish(&self, event: SyncEvent) {
        if let Err(e) = self.publisher.publish_event(event).await {
            warn!("Failed to publish sync event: {}", e);
        }
    }

    fn reset(inner: &mut EngineInner, user_id: Option<UserId>, page_size: u32) {
        inner.user_id = user_id;
        inner.state = SyncState::empty(page_size);
        inner.stats = NotificationStats::default();
        inner.stats_loaded = false;
        inner.generation += 1;
        inner.stats_epoch += 1;
    }
}

struct ReadUndo {
    id: NotificationId,
    counted: bool,
    stats_epoch: u64,
}

/// Appends `incoming` to `list`. An id already present keeps its position
/// and takes the newer copy's mutable fields.
fn merge_by_id(list: &mut Vec<Notification>, incoming: Vec<Notification>) {
    let mut positions: HashMap<NotificationId, usize> = list
        .iter()
        .enumerate()
        .map(|(index, n)| (n.id, index))
        .collect();

    for notification in incoming {
        match positions.get(&notification.id) {
            Some(&index) => list[index].merge_from(notification),
            None => {
                positions.insert(notification.id, list.len());
                list.push(notification);
            }
        }
    }
}
