use crate::domain::{
    entities::{DeviceRegistration, UserId},
    error::DomainResult,
    repositories::{DynNotificationTransport, DynPushTransport},
};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

type RegistrationFlight = Shared<BoxFuture<'static, bool>>;

/// The single slot for device binding work. `user_id` is `None` while a
/// cleanup is unbinding the previous user.
struct InFlight {
    id: u64,
    user_id: Option<UserId>,
    future: RegistrationFlight,
}

#[derive(Default)]
struct RegistrationState {
    current_user_id: Option<UserId>,
    initialized: bool,
    registration: Option<DeviceRegistration>,
    in_flight: Option<InFlight>,
    next_flight_id: u64,
}

/// Binds this client process to at most one user for push delivery.
///
/// Construct once at startup and share it behind an `Arc`. Concurrent
/// `initialize_for_user` calls for the same user attach to a single shared
/// registration future; switching users finishes or supersedes the previous
/// flight and clears its binding before the new user is registered.
pub struct DeviceRegistrationManager {
    transport: DynNotificationTransport,
    push: DynPushTransport,
    state: Arc<Mutex<RegistrationState>>,
}

impl std::fmt::Debug for DeviceRegistrationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DeviceRegistrationManager")
            .field("current_user_id", &state.current_user_id)
            .field("initialized", &state.initialized)
            .field("busy", &state.in_flight.is_some())
            .finish()
    }
}

impl DeviceRegistrationManager {
    pub fn new(transport: DynNotificationTransport, push: DynPushTransport) -> Self {
        Self {
            transport,
            push,
            state: Arc::new(Mutex::new(RegistrationState::default())),
        }
    }

    /// Registers this device for `user_id`. Never fails loudly: transport
    /// errors come back as `false` and the next call starts over.
    pub async fn initialize_for_user(&self, user_id: UserId, force_reinit: bool) -> bool {
        let flight = {
            let mut state = self.state.lock();
            let pending = state
                .in_flight
                .as_ref()
                .filter(|flight| flight.user_id == Some(user_id))
                .map(|flight| flight.future.clone());

            match pending {
                Some(future) => {
                    debug!("Joining in-flight device registration for user {}", user_id);
                    future
                }
                None if state.initialized
                    && state.current_user_id == Some(user_id)
                    && !force_reinit =>
                {
                    return true;
                }
                None => self.start_flight(&mut state, user_id, force_reinit),
            }
        };

        flight.await
    }

    /// Forgets the current user and asks the transport to drop the device
    /// binding. Safe to call when nothing was ever registered.
    ///
    /// The unbinding occupies the flight slot, so a registration started
    /// while it runs waits for the old binding to be cleared first.
    pub async fn cleanup(&self) {
        let flight = {
            let mut state = self.state.lock();
            let pending = state
                .in_flight
                .as_ref()
                .filter(|flight| flight.user_id.is_none())
                .map(|flight| flight.future.clone());

            match pending {
                Some(future) => future,
                None => self.start_cleanup(&mut state),
            }
        };

        flight.await;
    }

    pub fn current_user_id(&self) -> Option<UserId> {
        self.state.lock().current_user_id
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialized
    }

    pub fn is_initializing(&self) -> bool {
        self.state
            .lock()
            .in_flight
            .as_ref()
            .map_or(false, |flight| flight.user_id.is_some())
    }

    pub fn registration(&self) -> Option<DeviceRegistration> {
        self.state.lock().registration.clone()
    }

    fn start_flight(
        &self,
        state: &mut RegistrationState,
        user_id: UserId,
        force_reinit: bool,
    ) -> RegistrationFlight {
        let previous = state.in_flight.take().map(|flight| flight.future);
        let stale_user = state.current_user_id.filter(|current| *current != user_id);
        if let Some(old_user) = stale_user {
            info!(
                "Switching device registration from user {} to user {}",
                old_user, user_id
            );
        }

        state.initialized = false;
        state.registration = None;
        state.current_user_id = Some(user_id);
        state.next_flight_id += 1;
        let flight_id = state.next_flight_id;

        let transport = Arc::clone(&self.transport);
        let push = Arc::clone(&self.push);
        let shared_state = Arc::clone(&self.state);

        let future = async move {
            if let Some(previous) = previous {
                previous.await;
            }
            if let Some(old_user) = stale_user {
                if let Err(e) = transport.clear_device_binding(old_user).await {
                    warn!(
                        "Failed to clear device binding for previous user {}: {}",
                        old_user, e
                    );
                }
            }

            let result = Self::register(&transport, &push, user_id, force_reinit).await;
            Self::complete_flight(&shared_state, flight_id, user_id, result)
        }
        .boxed()
        .shared();

        state.in_flight = Some(InFlight {
            id: flight_id,
            user_id: Some(user_id),
            future: future.clone(),
        });
        future
    }

    fn start_cleanup(&self, state: &mut RegistrationState) -> RegistrationFlight {
        let previous = state.in_flight.take().map(|flight| flight.future);
        let user_id = state.current_user_id.take();
        state.initialized = false;
        state.registration = None;
        state.next_flight_id += 1;
        let flight_id = state.next_flight_id;

        let transport = Arc::clone(&self.transport);
        let shared_state = Arc::clone(&self.state);

        let future = async move {
            if let Some(previous) = previous {
                previous.await;
            }
            match user_id {
                Some(user_id) => match transport.clear_device_binding(user_id).await {
                    Ok(()) => info!("Cleared device binding for user {}", user_id),
                    Err(e) => warn!("Failed to clear device binding for user {}: {}", user_id, e),
                },
                None => debug!("Device registration cleanup with no active user"),
            }

            let mut state = shared_state.lock();
            if state.in_flight.as_ref().map(|flight| flight.id) == Some(flight_id) {
                state.in_flight = None;
            }
            true
        }
        .boxed()
        .shared();

        state.in_flight = Some(InFlight {
            id: flight_id,
            user_id: None,
            future: future.clone(),
        });
        future
    }

    async fn register(
        transport: &DynNotificationTransport,
        push: &DynPushTransport,
        user_id: UserId,
        force_reinit: bool,
    ) -> DomainResult<DeviceRegistration> {
        let already_registered = !force_reinit && transport.is_device_registered(user_id).await?;
        let device_token = push.device_token().await?;

        if already_registered {
            debug!("Device already registered for user {}", user_id);
            return Ok(DeviceRegistration::new(user_id, device_token));
        }

        transport.register_device(user_id, device_token).await
    }

    fn complete_flight(
        state: &Mutex<RegistrationState>,
        flight_id: u64,
        user_id: UserId,
        result: DomainResult<DeviceRegistration>,
    ) -> bool {
        let mut state = state.lock();
        let is_current = state.in_flight.as_ref().map(|flight| flight.id) == Some(flight_id);
        if !is_current {
            debug!("Device registration for user {} was superseded", user_id);
            return false;
        }

        state.in_flight = None;
        match result {
            Ok(registration) => {
                info!("Device registered for user {}", user_id);
                state.initialized = true;
                state.current_user_id = Some(user_id);
                state.registration = Some(registration);
                true
            }
            Err(e) => {
                warn!("Device registration failed for user {}: {}", user_id, e);
                state.initialized = false;
                state.current_user_id = None;
                state.registration = None;
                false
            }
        }
    }
}
