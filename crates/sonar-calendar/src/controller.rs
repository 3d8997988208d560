//! Calendar widget controller.
//!
//! The controller owns [`CalendarState`] and coordinates the data source,
//! the view filter, the navigation bridge and the renderer:
//!
//! ```text
//!   DataSource ──fetch──▶ normalize_events ──▶ CalendarState.events
//!                                                   │
//!   WidgetHandlers ──view/date/month──▶ filter_events ──▶ Renderer
//!                                                   │
//!   NavigationBridge ◀──open/close── details view ──┘
//! ```
//!
//! State sits behind a mutex that is never held across an `.await` or while
//! the renderer runs. Overlapping loads are not cancelled: whichever fetch
//! resolves last determines the loaded events.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, FixedOffset, Utc};
use sonar_calendar_core::{Event, Theme, ViewMode, add_months, filter_events};
use sonar_calendar_providers::{
    DataSource, Document, EmbeddedSource, FetchFilters, normalize_events,
};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::CalendarConfig;
use crate::error::{WidgetError, WidgetResult};
use crate::navigation::{NavigationBridge, NavigationEvent, NavigationListener, SubscriptionId};
use crate::render::{Renderer, WidgetHandlers};
use crate::state::{CalendarState, LoadStatus};

/// Construction options for [`CalendarController`].
#[derive(Clone, Default)]
pub struct CalendarOptions {
    /// Where the widget renders. Required.
    pub container: Option<Arc<dyn Renderer>>,
    pub config: CalendarConfig,
    /// Explicit data source; takes precedence over `api_url` and
    /// `data_selector`.
    pub source: Option<Arc<dyn DataSource>>,
    /// Host document, required when `data_selector` is set.
    pub document: Option<Arc<dyn Document>>,
    /// Navigation bridge; defaults to one over an in-memory history.
    pub bridge: Option<Arc<NavigationBridge>>,
    /// Initial reference date; defaults to now in the configured offset.
    pub current_date: Option<DateTime<FixedOffset>>,
    /// Initial view; defaults to upcoming.
    pub view: ViewMode,
}

impl CalendarOptions {
    pub fn new(container: Arc<dyn Renderer>) -> Self {
        Self {
            container: Some(container),
            ..Self::default()
        }
    }

    pub fn with_config(mut self, config: CalendarConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.config.theme = theme;
        self
    }

    pub fn with_api_url(mut self, url: Url) -> Self {
        self.config.api_url = Some(url);
        self
    }

    /// Reads events from `selector` in `document`.
    pub fn with_embedded(mut self, document: Arc<dyn Document>, selector: impl Into<String>) -> Self {
        self.document = Some(document);
        self.config.data_selector = Some(selector.into());
        self
    }

    pub fn with_source(mut self, source: Arc<dyn DataSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_document(mut self, document: Arc<dyn Document>) -> Self {
        self.document = Some(document);
        self
    }

    pub fn with_bridge(mut self, bridge: Arc<NavigationBridge>) -> Self {
        self.bridge = Some(bridge);
        self
    }

    pub fn with_current_date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.current_date = Some(date);
        self
    }

    pub fn with_view(mut self, view: ViewMode) -> Self {
        self.view = view;
        self
    }
}

impl std::fmt::Debug for CalendarOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarOptions")
            .field("container", &self.container.is_some())
            .field("config", &self.config)
            .field("source", &self.source.as_ref().map(|s| s.name().to_string()))
            .field("document", &self.document.is_some())
            .field("current_date", &self.current_date)
            .field("view", &self.view)
            .finish_non_exhaustive()
    }
}

/// Picks the data source: explicit source, then `api_url`, then
/// `data_selector`. None of them yields an empty calendar.
fn resolve_source(options: &CalendarOptions) -> WidgetResult<Option<Arc<dyn DataSource>>> {
    if let Some(source) = &options.source {
        return Ok(Some(Arc::clone(source)));
    }

    let config = &options.config;
    if let Some(url) = &config.api_url {
        return remote_source(url, config).map(Some);
    }

    if let Some(selector) = &config.data_selector {
        let document = options.document.clone().ok_or_else(|| {
            WidgetError::config(format!(
                "data selector {} is configured but no document was provided",
                selector
            ))
        })?;
        return Ok(Some(Arc::new(EmbeddedSource::new(document, selector.clone()))));
    }

    Ok(None)
}

#[cfg(feature = "remote")]
fn remote_source(url: &Url, config: &CalendarConfig) -> WidgetResult<Arc<dyn DataSource>> {
    use sonar_calendar_providers::{CachedSource, RemoteConfig, RemoteSource};

    let remote = RemoteSource::new(
        RemoteConfig::new(url.clone()).with_timeout(config.request_timeout()),
    )?;

    if config.cache_ttl_secs > 0 {
        Ok(Arc::new(CachedSource::new(remote, config.cache_ttl())))
    } else {
        Ok(Arc::new(remote))
    }
}

#[cfg(not(feature = "remote"))]
fn remote_source(url: &Url, _config: &CalendarConfig) -> WidgetResult<Arc<dyn DataSource>> {
    Err(WidgetError::config(format!(
        "cannot use {}: built without remote endpoint support",
        url
    )))
}

struct Inner {
    state: Mutex<CalendarState>,
    renderer: Arc<dyn Renderer>,
    source: Option<Arc<dyn DataSource>>,
    bridge: Arc<NavigationBridge>,
    subscription: Mutex<Option<SubscriptionId>>,
    last_filters: Mutex<Option<FetchFilters>>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, CalendarState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn render_current(&self) {
        let (view, title, events, empty) = {
            let state = self.state();
            (
                state.current_view,
                view_title(&state),
                filter_events(&state.events, &state.current_date, state.current_view),
                empty_message(state.current_view),
            )
        };
        self.renderer.render_events(view, &title, &events, &empty);
    }

    async fn load_events(&self, filters: Option<FetchFilters>) {
        let filters = filters.unwrap_or_default();
        *self
            .last_filters
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(filters.clone());
        self.state().load_status = LoadStatus::Loading;
        self.renderer.render_loading();

        let result = match &self.source {
            Some(source) => {
                debug!(source = source.name(), "loading events");
                source
                    .fetch(&filters)
                    .await
                    .map(|payload| normalize_events(&payload))
            }
            None => {
                warn!("no data source configured, provide either an api_url or a data_selector");
                Ok(Vec::new())
            }
        };

        match result {
            Ok(events) => {
                info!(count = events.len(), "events loaded");
                let stale = {
                    let mut state = self.state();
                    state.events = events;
                    state.load_status = LoadStatus::Loaded;
                    let active = state.active_event_id.clone();
                    active.filter(|id| state.event(id).is_none())
                };
                self.render_current();
                // The open event may not survive a reload.
                if let Some(event_id) = stale {
                    warn!(event_id = %event_id, "open event is no longer loaded, closing details");
                    self.hide();
                    self.bridge.close();
                }
                self.restore_deep_link().await;
            }
            Err(e) => {
                error!(error = %e, kind = %e.kind(), status = e.status(), "failed to load events");
                let message = e.message().to_string();
                self.state().load_status = LoadStatus::Failed(message.clone());
                self.renderer.render_error(&message);
            }
        }
    }

    /// Opens the event named by the current fragment, if nothing is open.
    async fn restore_deep_link(&self) {
        let Some(event_id) = self.bridge.current_event_id() else {
            return;
        };
        if self.state().active_event_id.is_some() {
            return;
        }

        // Let the freshly rendered view settle first.
        tokio::task::yield_now().await;

        let event = self.state().event(&event_id).cloned();
        match event {
            Some(event) => {
                debug!(event_id = %event.id, "restoring deep link");
                self.show(event);
            }
            None => {
                warn!(event_id = %event_id, "deep link points at an unknown event");
                self.bridge.close();
            }
        }
    }

    fn show(&self, event: Event) {
        self.state().active_event_id = Some(event.id.clone());
        self.renderer.show_details(&event);
    }

    /// Hides the details view if one is open. Returns whether it was open.
    fn hide(&self) -> bool {
        let was_open = self.state().active_event_id.take().is_some();
        if was_open {
            self.renderer.hide_details();
        }
        was_open
    }

    fn handle_event_activated(&self, event: &Event) {
        debug!(event_id = %event.id, "event activated");
        self.bridge.open(&event.id);
        self.show(event.clone());
    }

    fn handle_details_closed(&self) {
        self.hide();
        self.bridge.close();
    }

    fn navigate(&self, direction: i32) {
        if direction != 1 && direction != -1 {
            warn!(direction, "navigation direction must be -1 or 1");
            return;
        }

        {
            let mut state = self.state();
            let Some(date) = add_months(&state.current_date, direction) else {
                warn!(direction, "month navigation out of range");
                return;
            };
            debug!(from = %state.current_date, to = %date, "navigating");
            state.current_date = date;
        }
        self.render_current();
    }

    fn set_view(&self, view: ViewMode) {
        {
            let mut state = self.state();
            if state.current_view == view {
                return;
            }
            debug!(from = %state.current_view, to = %view, "switching view");
            state.current_view = view;
        }
        self.render_current();
    }

    fn set_date(&self, date: DateTime<FixedOffset>) {
        self.state().current_date = date;
        self.render_current();
    }

    fn set_theme(&self, theme: Theme) {
        self.state().theme = theme;
        self.renderer.apply_theme(theme);
        self.render_current();
    }

    fn handle_navigation(&self, event: NavigationEvent) {
        match event {
            NavigationEvent::Open(id) => {
                let event = self.state().event(&id).cloned();
                match event {
                    Some(event) => self.show(event),
                    None => {
                        self.hide();
                        self.bridge.close();
                    }
                }
            }
            NavigationEvent::Close => {
                self.hide();
            }
        }
    }

    fn unsubscribe(&self) {
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(id) = subscription {
            self.bridge.unsubscribe(id);
            debug!("unsubscribed from navigation bridge");
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

fn view_title(state: &CalendarState) -> String {
    match state.current_view {
        ViewMode::Upcoming => "Upcoming Events".to_string(),
        _ => state.current_date.format("%B %Y").to_string(),
    }
}

fn empty_message(view: ViewMode) -> String {
    format!("No {} events found.", view)
}

/// Weak link from the bridge and the renderer back to the controller.
///
/// Calls become no-ops once the controller is gone.
struct ControllerLink(Weak<Inner>);

impl NavigationListener for ControllerLink {
    fn contains_event(&self, event_id: &str) -> bool {
        self.0
            .upgrade()
            .is_some_and(|inner| inner.state().event(event_id).is_some())
    }

    fn on_navigation(&self, event: NavigationEvent) {
        if let Some(inner) = self.0.upgrade() {
            inner.handle_navigation(event);
        }
    }
}

impl WidgetHandlers for ControllerLink {
    fn on_activate(&self, event: &Event) {
        if let Some(inner) = self.0.upgrade() {
            inner.handle_event_activated(event);
        }
    }

    fn on_view_change(&self, view: ViewMode) {
        if let Some(inner) = self.0.upgrade() {
            inner.set_view(view);
        }
    }

    fn on_date_change(&self, date: DateTime<FixedOffset>) {
        if let Some(inner) = self.0.upgrade() {
            inner.set_date(date);
        }
    }

    fn on_navigate(&self, direction: i32) {
        if let Some(inner) = self.0.upgrade() {
            inner.navigate(direction);
        }
    }

    fn on_details_closed(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.handle_details_closed();
        }
    }
}

/// The calendar widget.
///
/// Cloning yields another handle to the same widget. The navigation
/// subscription is released by [`destroy`](Self::destroy) or when the last
/// handle is dropped.
#[derive(Clone)]
pub struct CalendarController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for CalendarController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarController")
            .field("state", &*self.inner.state())
            .finish_non_exhaustive()
    }
}

impl CalendarController {
    /// Creates the widget, renders its chrome and subscribes to navigation.
    ///
    /// Events are not loaded until [`mount`](Self::mount) is awaited.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::Config`] when the container is missing, the
    /// configured offset is invalid, or a data selector has no document to
    /// read from.
    pub fn new(options: CalendarOptions) -> WidgetResult<Self> {
        let renderer = options
            .container
            .clone()
            .ok_or_else(|| WidgetError::config("Container element is required"))?;
        let offset = options.config.utc_offset()?;
        let source = resolve_source(&options)?;
        let theme = options.config.theme;
        let current_date = options
            .current_date
            .unwrap_or_else(|| Utc::now().with_timezone(&offset));
        let bridge = options
            .bridge
            .unwrap_or_else(|| Arc::new(NavigationBridge::in_memory()));

        info!(
            source = source.as_ref().map(|s| s.name()).unwrap_or("none"),
            theme = %theme,
            "creating calendar widget"
        );

        let mut state = CalendarState::new(current_date, theme);
        state.current_view = options.view;

        let inner = Arc::new(Inner {
            state: Mutex::new(state),
            renderer,
            source,
            bridge,
            subscription: Mutex::new(None),
            last_filters: Mutex::new(None),
        });

        inner.renderer.apply_theme(theme);
        inner.renderer.render_chrome(theme);

        let link = Arc::new(ControllerLink(Arc::downgrade(&inner)));
        inner.renderer.register_handlers(link.clone());
        let subscription = inner.bridge.subscribe(link);
        *inner
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(subscription);

        Ok(Self { inner })
    }

    /// Performs the initial load.
    pub async fn mount(&self) {
        self.inner.load_events(None).await;
    }

    /// Loads events and re-renders the current view.
    ///
    /// Failures never propagate: they end in [`LoadStatus::Failed`] and a
    /// rendered error with a retry control.
    pub async fn load_events(&self, filters: Option<FetchFilters>) {
        self.inner.load_events(filters).await;
    }

    /// Repeats the last load with the same filters.
    pub async fn retry(&self) {
        let filters = self
            .inner
            .last_filters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        self.inner.load_events(filters).await;
    }

    /// Moves the reference date one month back (`-1`) or forward (`1`).
    ///
    /// Other values are ignored. Events are not reloaded.
    pub fn navigate(&self, direction: i32) {
        self.inner.navigate(direction);
    }

    /// Switches the view. No-op when unchanged.
    pub fn set_view(&self, view: ViewMode) {
        self.inner.set_view(view);
    }

    /// Switches the view by name. Unknown names are ignored.
    pub fn set_view_str(&self, view: &str) {
        match view.parse() {
            Ok(view) => self.inner.set_view(view),
            Err(e) => warn!(error = %e, "ignoring view change"),
        }
    }

    /// Sets the reference date (date picker).
    pub fn set_date(&self, date: DateTime<FixedOffset>) {
        self.inner.set_date(date);
    }

    pub fn set_theme(&self, theme: Theme) {
        self.inner.set_theme(theme);
    }

    /// Opens the details view for `event` and pushes its deep link.
    pub fn handle_event_activated(&self, event: &Event) {
        self.inner.handle_event_activated(event);
    }

    /// Closes the details view and strips the deep link.
    pub fn handle_details_closed(&self) {
        self.inner.handle_details_closed();
    }

    /// To be called by the host after a back/forward move.
    pub fn handle_pop_state(&self) {
        self.inner.bridge.handle_pop_state();
    }

    /// Events visible in the current view.
    pub fn visible_events(&self) -> Vec<Event> {
        let state = self.inner.state();
        filter_events(&state.events, &state.current_date, state.current_view)
    }

    /// "Upcoming Events", or the month and year of the reference date.
    pub fn view_title(&self) -> String {
        view_title(&self.inner.state())
    }

    /// Message shown when the current view has no events.
    pub fn empty_message(&self) -> String {
        empty_message(self.inner.state().current_view)
    }

    /// Looks up a loaded event by id.
    pub fn event(&self, id: &str) -> Option<Event> {
        self.inner.state().event(id).cloned()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> CalendarState {
        self.inner.state().clone()
    }

    pub fn bridge(&self) -> &Arc<NavigationBridge> {
        &self.inner.bridge
    }

    /// Name of the data source in use, if any.
    pub fn source_name(&self) -> Option<&str> {
        self.inner.source.as_ref().map(|source| source.name())
    }

    /// Releases the navigation subscription. Safe to call repeatedly.
    pub fn destroy(&self) {
        self.inner.unsubscribe();
    }
}
