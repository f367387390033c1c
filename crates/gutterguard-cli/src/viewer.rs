use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use gutterguard_core::{
    aggregate, AppState, BucketedSeries, CancelHandle, Cancellation, Coordinates, DashboardConfig,
    DashboardMonitor, DashboardSnapshot, DeviceStore, Granularity, LoginGate, LogoutReason, Route,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Points};
use ratatui::widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Tabs};
use ratatui::Terminal;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::report;

const HISTORY_PAGE: usize = 8;

/// Background refresh owned by one logged-in session. Dropping it cancels
/// any read still in flight.
struct SessionTasks {
    _cancel: CancelHandle,
    refresh_tx: mpsc::Sender<()>,
    snapshots: watch::Receiver<Option<DashboardSnapshot>>,
    task: JoinHandle<()>,
}

impl SessionTasks {
    fn start(store: Arc<dyn DeviceStore>, config: DashboardConfig) -> Self {
        let (cancel_handle, cancel) = Cancellation::new();
        let (refresh_tx, refresh_rx) = mpsc::channel(4);
        let (snapshot_tx, snapshots) = watch::channel(None);
        let monitor = DashboardMonitor::new(store, config);
        let task = tokio::spawn(refresh_loop(monitor, cancel, refresh_rx, snapshot_tx));

        Self {
            _cancel: cancel_handle,
            refresh_tx,
            snapshots,
            task,
        }
    }

    fn request_refresh(&self) {
        let _ = self.refresh_tx.try_send(());
    }
}

impl Drop for SessionTasks {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn refresh_loop(
    mut monitor: DashboardMonitor<Arc<dyn DeviceStore>>,
    mut cancel: Cancellation,
    mut requests: mpsc::Receiver<()>,
    snapshots: watch::Sender<Option<DashboardSnapshot>>,
) {
    loop {
        let snapshot = monitor.tick(&cancel).await;
        if cancel.is_cancelled() {
            break;
        }
        if snapshots.send(Some(snapshot)).is_err() {
            break;
        }

        tokio::select! {
            _ = sleep(monitor.refresh_interval()) => {}
            request = requests.recv() => {
                if request.is_none() {
                    break;
                }
            }
            _ = cancel.cancelled() => break,
        }
    }
    debug!("refresh loop stopped");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginField {
    Username,
    Password,
}

#[derive(Debug)]
struct LoginForm {
    username: String,
    password: String,
    focus: LoginField,
}

impl LoginForm {
    fn new() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            focus: LoginField::Username,
        }
    }

    fn field_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }
}

struct ViewerState {
    store: Arc<dyn DeviceStore>,
    config: DashboardConfig,
    app: AppState,
    form: LoginForm,
    session: Option<SessionTasks>,
    latest: Option<DashboardSnapshot>,
    series: Option<BucketedSeries>,
    granularity: Granularity,
    history_page: usize,
    device_offset: usize,
}

enum Flow {
    Continue,
    Quit,
}

impl ViewerState {
    fn new(store: Arc<dyn DeviceStore>, config: DashboardConfig, gate: LoginGate) -> Self {
        Self {
            store,
            config,
            app: AppState::new(gate),
            form: LoginForm::new(),
            session: None,
            latest: None,
            series: None,
            granularity: Granularity::Hour,
            history_page: 0,
            device_offset: 0,
        }
    }

    fn end_session(&mut self) {
        self.session = None;
        self.latest = None;
        self.series = None;
        self.history_page = 0;
        self.device_offset = 0;
    }

    fn history_pages(&self) -> usize {
        let events = self
            .latest
            .as_ref()
            .map_or(0, |s| s.devices.histories().map(|h| h.len()).sum::<usize>());
        page_count(events)
    }

    fn rebuild_series(&mut self) {
        self.series = self.latest.as_ref().map(|snapshot| {
            let now = chrono::Local::now().naive_local();
            aggregate(snapshot.devices.histories(), self.granularity, now)
        });
    }

    fn poll_snapshot(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.snapshots.has_changed().unwrap_or(false) {
            return;
        }
        let snapshot = session.snapshots.borrow_and_update().clone();
        if let Some(snapshot) = snapshot {
            self.latest = Some(snapshot);
            self.history_page = self.history_page.min(self.history_pages() - 1);
            self.rebuild_series();
        }
    }

    fn tick(&mut self, now: Instant) {
        if self.app.tick(now) == Some(LogoutReason::Inactivity) {
            info!("session expired after inactivity");
            self.end_session();
        }
        self.poll_snapshot();
    }

    async fn on_key(&mut self, key: KeyEvent, now: Instant) -> Flow {
        if self.app.route().is_none() {
            return self.on_login_key(key, now).await;
        }

        self.app.touch(now);
        let current = self.app.route().unwrap_or(Route::Dashboard);
        let target = match key.code {
            KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Char('o') => {
                self.app.logout();
                self.end_session();
                return Flow::Continue;
            }
            KeyCode::Char('r') => {
                if let Some(session) = &self.session {
                    session.request_refresh();
                }
                None
            }
            KeyCode::Char('g') => {
                self.granularity = self.granularity.next();
                self.rebuild_series();
                None
            }
            KeyCode::Char('n') | KeyCode::PageDown => {
                self.history_page = (self.history_page + 1).min(self.history_pages() - 1);
                None
            }
            KeyCode::Char('p') | KeyCode::PageUp => {
                self.history_page = self.history_page.saturating_sub(1);
                None
            }
            KeyCode::Down => {
                self.device_offset += 1;
                None
            }
            KeyCode::Up => {
                self.device_offset = self.device_offset.saturating_sub(1);
                None
            }
            KeyCode::Tab | KeyCode::Right => Some(current.next()),
            KeyCode::BackTab | KeyCode::Left => Some(current.previous()),
            KeyCode::Char(c @ '1'..='4') => Route::ALL.get(c as usize - '1' as usize).copied(),
            _ => None,
        };

        if let Some(route) = target {
            let _ = self.app.navigate(route, now);
        }
        Flow::Continue
    }

    async fn on_login_key(&mut self, key: KeyEvent, now: Instant) -> Flow {
        match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => self.form.toggle_focus(),
            KeyCode::Backspace => {
                self.form.field_mut().pop();
            }
            KeyCode::Char(c) => self.form.field_mut().push(c),
            KeyCode::Enter => {
                if self.form.focus == LoginField::Username {
                    self.form.toggle_focus();
                    return Flow::Continue;
                }
                let logged_in = self
                    .app
                    .login(self.store.as_ref(), &self.form.username, &self.form.password, now)
                    .await;
                self.form.password.clear();
                if logged_in {
                    self.form = LoginForm::new();
                    self.session = Some(SessionTasks::start(Arc::clone(&self.store), self.config.clone()));
                }
            }
            _ => {}
        }
        Flow::Continue
    }
}

pub async fn run_viewer(store: Arc<dyn DeviceStore>, config: DashboardConfig, gate: LoginGate) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = ViewerState::new(store, config, gate);

    let run_result = async {
        loop {
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        if let Flow::Quit = state.on_key(key, Instant::now()).await {
                            break;
                        }
                    }
                }
            }

            state.tick(Instant::now());
            terminal.draw(|frame| draw_ui(frame.size(), frame, &state))?;
        }

        Ok::<(), anyhow::Error>(())
    }
    .await;

    state.app.close();
    state.end_session();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}

fn draw_ui(area: Rect, frame: &mut ratatui::Frame<'_>, state: &ViewerState) {
    let Some(route) = state.app.route() else {
        draw_login(area, frame, state);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let titles: Vec<Line> = Route::ALL
        .iter()
        .enumerate()
        .map(|(i, r)| Line::from(format!("{} {}", i + 1, r.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("GutterGuard"))
        .select(route.index())
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, rows[0]);
    frame.render_widget(render_status(state), rows[1]);

    let Some(snapshot) = &state.latest else {
        let waiting = Paragraph::new("Waiting for first snapshot...")
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(waiting, rows[2]);
        return;
    };

    match route {
        Route::Dashboard => {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                .split(rows[2]);
            render_map(frame, cols[0], snapshot, false);
            frame.render_widget(render_summary(snapshot), cols[1]);
        }
        Route::DeviceLocation => render_map(frame, rows[2], snapshot, true),
        Route::DeviceConfig => render_devices(frame, rows[2], snapshot, state.device_offset),
        Route::Historical => {
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(HISTORY_PAGE as u16 + 3), Constraint::Min(0)])
                .split(rows[2]);
            render_history(frame, parts[0], snapshot, state.history_page);
            if let Some(series) = &state.series {
                render_series(frame, parts[1], series);
            }
        }
    }
}

fn render_status(state: &ViewerState) -> Paragraph<'static> {
    let user = state.app.gate().username().unwrap_or("-").to_string();
    let line = match &state.latest {
        Some(s) => {
            let color = if s.freshness.stale { Color::Yellow } else { Color::Green };
            let failures = if s.status.failures.is_empty() {
                String::new()
            } else {
                format!("  error={}", s.status.failures.join(", "))
            };
            Line::from(vec![
                Span::styled(
                    format!("{} ", s.status.code),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(
                    "{}  stale={} age_ms={} rtt_ms={}  user={user}{failures}",
                    s.source, s.freshness.stale, s.freshness.age_ms, s.freshness.rtt_ms
                )),
            ])
        }
        None => Line::from(format!("user={user}  loading...")),
    };
    let help = "tab/1-4 views  r refresh  g granularity  n/p page  o logout  q quit";
    Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(help))
}

fn draw_login(area: Rect, frame: &mut ratatui::Frame<'_>, state: &ViewerState) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(9), Constraint::Min(0)])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(44), Constraint::Min(0)])
        .split(vertical[1]);

    let focus_style = |field: LoginField| {
        if state.form.focus == field {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Username: ", focus_style(LoginField::Username)),
            Span::raw(state.form.username.clone()),
        ]),
        Line::from(vec![
            Span::styled("Password: ", focus_style(LoginField::Password)),
            Span::raw("*".repeat(state.form.password.chars().count())),
        ]),
        Line::from(""),
    ];

    if let Some(error) = state.app.gate().error() {
        lines.push(Line::from(Span::styled(error.to_string(), Style::default().fg(Color::Red))));
    } else if state.app.gate().last_logout() == Some(LogoutReason::Inactivity) {
        lines.push(Line::from(Span::styled(
            "Session expired after inactivity",
            Style::default().fg(Color::Yellow),
        )));
    }
    lines.push(Line::from("enter submit  tab switch  esc quit"));

    let form = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Login"));
    frame.render_widget(form, horizontal[1]);
}

fn page_count(rows: usize) -> usize {
    rows.div_ceil(HISTORY_PAGE).max(1)
}

fn map_bounds(points: &[Coordinates], center: Coordinates) -> ([f64; 2], [f64; 2]) {
    const MIN_SPAN: f64 = 0.005;
    if points.is_empty() {
        return (
            [center.longitude - MIN_SPAN, center.longitude + MIN_SPAN],
            [center.latitude - MIN_SPAN, center.latitude + MIN_SPAN],
        );
    }
    let (mut lon_min, mut lon_max) = (f64::MAX, f64::MIN);
    let (mut lat_min, mut lat_max) = (f64::MAX, f64::MIN);
    for p in points {
        lon_min = lon_min.min(p.longitude);
        lon_max = lon_max.max(p.longitude);
        lat_min = lat_min.min(p.latitude);
        lat_max = lat_max.max(p.latitude);
    }
    let lon_pad = ((lon_max - lon_min) * 0.15).max(MIN_SPAN);
    let lat_pad = ((lat_max - lat_min) * 0.15).max(MIN_SPAN);
    (
        [lon_min - lon_pad, lon_max + lon_pad],
        [lat_min - lat_pad, lat_max + lat_pad],
    )
}

fn render_map(frame: &mut ratatui::Frame<'_>, area: Rect, snapshot: &DashboardSnapshot, labels: bool) {
    let markers = report::markers(&snapshot.devices);
    let clogged: Vec<(f64, f64)> = markers
        .iter()
        .filter(|m| m.clogged)
        .map(|m| (m.longitude, m.latitude))
        .collect();
    let cleared: Vec<(f64, f64)> = markers
        .iter()
        .filter(|m| !m.clogged)
        .map(|m| (m.longitude, m.latitude))
        .collect();
    let coords: Vec<Coordinates> = snapshot.devices.mappable().map(|(_, c)| c).collect();
    let (x_bounds, y_bounds) = map_bounds(&coords, snapshot.devices.map_center());

    let title = format!(
        "Map  {} placed / {} devices  (red = clogged)",
        markers.len(),
        snapshot.devices.len()
    );
    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .marker(symbols::Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| {
            ctx.draw(&Points {
                coords: &cleared,
                color: Color::Green,
            });
            ctx.draw(&Points {
                coords: &clogged,
                color: Color::Red,
            });
            if labels {
                for marker in &markers {
                    let color = if marker.clogged { Color::Red } else { Color::Green };
                    ctx.print(
                        marker.longitude,
                        marker.latitude,
                        Span::styled(format!(" {}", marker.popup[0]), Style::default().fg(color)),
                    );
                }
            }
        });
    frame.render_widget(canvas, area);
}

fn render_summary(snapshot: &DashboardSnapshot) -> Paragraph<'static> {
    let lines: Vec<Line> = report::summary_text(&snapshot.summary)
        .lines()
        .map(|l| Line::from(l.to_string()))
        .collect();
    Paragraph::new(lines)
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::ALL).title("Summary"))
}

fn render_devices(frame: &mut ratatui::Frame<'_>, area: Rect, snapshot: &DashboardSnapshot, offset: usize) {
    let rows = report::device_rows(&snapshot.devices);
    let offset = offset.min(rows.len().saturating_sub(1));
    let body: Vec<Row> = rows
        .iter()
        .skip(offset)
        .map(|r| {
            let clog_style = if r.clog_status == "Clogged" {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Green)
            };
            Row::new(vec![
                Cell::from(r.id.clone()),
                Cell::from(r.name.clone()),
                Cell::from(r.address.clone()),
                Cell::from(r.latitude.map(|v| format!("{v:.5}")).unwrap_or_else(|| "-".into())),
                Cell::from(r.longitude.map(|v| format!("{v:.5}")).unwrap_or_else(|| "-".into())),
                Cell::from(r.clog_status.clone()).style(clog_style),
                Cell::from(r.maintenance_status.clone()),
            ])
        })
        .collect();

    let header = Row::new(vec!["ID", "Name", "Address", "Latitude", "Longitude", "Clog", "Maintenance"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let widths = [
        Constraint::Length(12),
        Constraint::Length(18),
        Constraint::Min(20),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Length(24),
    ];
    let table = Table::new(body, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(format!("Devices ({})", rows.len())));
    frame.render_widget(table, area);
}

fn render_history(frame: &mut ratatui::Frame<'_>, area: Rect, snapshot: &DashboardSnapshot, page: usize) {
    let rows = report::history_rows(&snapshot.devices, None);
    let pages = page_count(rows.len());
    let page = page.min(pages - 1);
    let body: Vec<Row> = report::page(&rows, page, HISTORY_PAGE)
        .iter()
        .map(|r| {
            Row::new(vec![
                r.timestamp.clone(),
                r.name.clone(),
                r.clog_status.clone(),
                r.maintenance_status.clone(),
            ])
        })
        .collect();

    let header = Row::new(vec!["Timestamp", "Name", "Clog Status", "Maintenance Status"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let widths = [
        Constraint::Length(22),
        Constraint::Min(16),
        Constraint::Length(12),
        Constraint::Length(24),
    ];
    let title = format!("Clog history  page {}/{}  ({} events)", page + 1, pages, rows.len());
    let table = Table::new(body, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(table, area);
}

fn render_series(frame: &mut ratatui::Frame<'_>, area: Rect, series: &BucketedSeries) {
    let to_points = |counts: &[u32]| -> Vec<(f64, f64)> {
        counts
            .iter()
            .enumerate()
            .map(|(i, c)| (i as f64, f64::from(*c)))
            .collect()
    };
    let clogged = to_points(&series.clogged);
    let cleared = to_points(&series.cleared);

    let x_max = series.granularity.len().saturating_sub(1) as f64;
    let y_max = f64::from(series.peak().max(1));
    let last = series.granularity.len().saturating_sub(1);

    let datasets = vec![
        Dataset::default()
            .name("Clogged")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Red))
            .data(&clogged),
        Dataset::default()
            .name("Cleared")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(&cleared),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} events ({} total)", series.granularity.title(), series.total())),
        )
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, x_max])
                .labels(vec![
                    Span::raw(series.granularity.bucket_label(0)),
                    Span::raw(series.granularity.bucket_label(last / 2)),
                    Span::raw(series.granularity.bucket_label(last)),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("events")
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format!("{:.0}", y_max / 2.0)),
                    Span::raw(format!("{y_max:.0}")),
                ]),
        );

    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer_with(tree: serde_json::Value) -> ViewerState {
        let dir = tempfile::tempdir().expect("temp dir");
        let store: Arc<dyn DeviceStore> =
            Arc::new(gutterguard_core::FileStore::new(dir.path().join("db.json")));
        let gate = LoginGate::new(Default::default(), Duration::from_secs(900));
        let mut state = ViewerState::new(store, DashboardConfig::default(), gate);
        let devices = gutterguard_core::DeviceSnapshot::from_tree(Some(&tree), chrono::Utc::now());
        let summary = gutterguard_core::DashboardSummary::of(&devices);
        state.latest = Some(DashboardSnapshot {
            ts: chrono::Utc::now(),
            source: "test".to_string(),
            devices,
            summary,
            freshness: gutterguard_core::snapshot::Freshness {
                rtt_ms: 0,
                age_ms: 0,
                stale: false,
                last_ok_ts: None,
            },
            status: gutterguard_core::snapshot::FetchStatus {
                code: "OK".to_string(),
                failures: Vec::new(),
            },
            quality: gutterguard_core::snapshot::FetchQuality { reads_ok: 1, reads_err: 0 },
        });
        state
    }

    #[tokio::test]
    async fn history_paging_stops_at_last_page() {
        let events: serde_json::Map<String, serde_json::Value> = (0..10)
            .map(|i| (format!("01152024_1{i}0000"), serde_json::Value::Bool(i % 2 == 0)))
            .collect();
        let mut state = viewer_with(serde_json::json!({"dev1": {"isClogged": events}}));
        let store = Arc::clone(&state.store);
        assert!(state.app.login(store.as_ref(), "admin", "admin123", Instant::now()).await);

        for _ in 0..5 {
            state.on_key(KeyEvent::from(KeyCode::Char('n')), Instant::now()).await;
        }
        assert_eq!(state.history_page, 1);

        state.on_key(KeyEvent::from(KeyCode::Char('p')), Instant::now()).await;
        assert_eq!(state.history_page, 0);
    }

    #[test]
    fn page_count_is_never_zero() {
        assert_eq!(page_count(0), 1);
        assert_eq!(page_count(8), 1);
        assert_eq!(page_count(9), 2);
    }

    #[test]
    fn map_bounds_pad_single_point() {
        let center = Coordinates {
            latitude: 14.5,
            longitude: 121.0,
        };
        let (x, y) = map_bounds(&[center], center);
        assert!(x[0] < 121.0 && x[1] > 121.0);
        assert!(y[0] < 14.5 && y[1] > 14.5);
    }

    #[test]
    fn map_bounds_cover_every_point() {
        let points = [
            Coordinates {
                latitude: 14.50,
                longitude: 120.90,
            },
            Coordinates {
                latitude: 14.70,
                longitude: 121.10,
            },
        ];
        let (x, y) = map_bounds(&points, points[0]);
        assert!(x[0] < 120.90 && x[1] > 121.10);
        assert!(y[0] < 14.50 && y[1] > 14.70);
    }
}
