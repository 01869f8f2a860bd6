// ============================================================================
// Chart - Rendu du graphique de prix
// ============================================================================
// Dessine l'écran complet :
// - header : symbole, onglets de période, prix ou point survolé
// - graphique : aire en dégradé, ligne, clôture précédente, marqueur de drag
// - footer : raccourcis clavier ou confirmation de sortie
//
// Les labels des axes sont placés ici, à la colonne / ligne exacte de leur
// graduation : le widget Chart de ratatui répartirait ses labels à
// intervalles réguliers, ce qui ne correspond pas aux graduations calculées.
// Chaque graduation labellisée a sa ligne de grille pointillée et sa marque
// sur l'axe ; les prix sont sur le bord droit du plot.
//
// CONCEPTS RATATUI :
// 1. Chart + Dataset : plusieurs séries superposées (ordre = profondeur)
// 2. Layout : zones fixes pour que la souris sache où est le plot
// 3. Color::Rgb : dégradé vers le fond
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, FetchPhase};
use crate::chart_data::axis::format_price;
use crate::models::{ChartAxisData, ChartRange, ChartViewData};

/// Nombre de bandes de l'aire sous la courbe
const GRADIENT_BANDS: usize = 5;

/// Opacité de la bande la plus claire / la plus sombre (0 = couleur de la ligne)
const GRADIENT_FADE_START: f64 = 0.35;
const GRADIENT_FADE_END: f64 = 0.9;

/// Un point de la ligne de clôture précédente toutes les N colonnes
const RULE_DOT_SPACING: f64 = 2.0;

/// Un point de grille horizontale toutes les N colonnes
const GRID_DOT_SPACING: f64 = 4.0;

/// Marque d'une graduation Y, devant son label
const Y_TICK: &str = "├ ";

/// Axe X : ligne de base et marque des graduations
const X_AXIS_LINE: char = '─';
const X_TICK: char = '┬';

// ============================================================================
// Fonction principale de rendu
// ============================================================================

/// Dessine l'écran
///
/// Retourne la zone du plot quand un graphique est affiché : la boucle
/// principale s'en sert pour convertir la souris en coordonnées du plot.
pub fn render(frame: &mut Frame, app: &App) -> Option<Rect> {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header
            Constraint::Min(0),    // Graphique
            Constraint::Length(1), // Footer
        ])
        .split(frame.size());

    render_header(frame, app, chunks[0]);
    let plot = render_body(frame, app, chunks[1]);
    render_footer(frame, app, chunks[2]);
    plot
}

// ============================================================================
// Header
// ============================================================================

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" 📈 {} ", app.symbol));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let titles: Vec<&str> = ChartRange::all().iter().map(|range| range.label()).collect();
    let tabs = Tabs::new(titles)
        .select(app.selected_range.position())
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
        )
        .divider(symbols::DOT);
    frame.render_widget(tabs, rows[0]);

    frame.render_widget(Paragraph::new(header_line(app)), rows[1]);
}

/// Ligne d'information : point survolé pendant un drag, sinon dernier prix
fn header_line(app: &App) -> Line<'static> {
    if let Some(item) = app.selected_item() {
        return Line::from(vec![
            Span::styled(item.formatted_date.clone(), Style::default().fg(Color::Gray)),
            Span::raw("  "),
            Span::styled(
                format_quote(item.value),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
        ]);
    }

    match &app.phase {
        FetchPhase::Initial | FetchPhase::Fetching => Line::from(Span::styled(
            "Chargement...",
            Style::default().fg(Color::Gray),
        )),
        FetchPhase::Empty | FetchPhase::Failure(_) => {
            Line::from(Span::styled("—", Style::default().fg(Color::Gray)))
        }
        FetchPhase::Success(data) => {
            let (r, g, b) = data.line_color.rgb();
            let color = Color::Rgb(r, g, b);
            let mut spans = match app.price_change() {
                Some((last, change, percent)) => {
                    let arrow = if change >= 0.0 { "▲" } else { "▼" };
                    vec![
                        Span::styled(
                            format_quote(last),
                            Style::default().fg(color).add_modifier(Modifier::BOLD),
                        ),
                        Span::raw("  "),
                        Span::styled(
                            format!("{} {:+.2} ({:+.2}%)", arrow, change, percent),
                            Style::default().fg(color),
                        ),
                    ]
                }
                None => vec![Span::styled(
                    data.last_item().map(|item| format_quote(item.value)).unwrap_or_default(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )],
            };
            if app.is_refreshing {
                spans.push(Span::styled("  ⟳", Style::default().fg(Color::Gray)));
            }
            Line::from(spans)
        }
    }
}

/// Prix affiché dans le header (4 décimales sous 1)
fn format_quote(value: f64) -> String {
    let decimals = if value.abs() < 1.0 { 4 } else { 2 };
    format_price(value, decimals)
}

// ============================================================================
// Corps : graphique ou placeholder
// ============================================================================

fn render_body(frame: &mut Frame, app: &App, area: Rect) -> Option<Rect> {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(format!(" {} ", app.selected_range.label()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match &app.phase {
        FetchPhase::Success(data) => render_chart(frame, app, data, inner),
        FetchPhase::Initial | FetchPhase::Fetching => {
            render_placeholder(frame, inner, &format!("Chargement de {}...", app.symbol), Color::Gray);
            None
        }
        FetchPhase::Empty => {
            let message = format!(
                "Aucune donnée pour {} sur {}",
                app.symbol,
                app.selected_range.label()
            );
            render_placeholder(frame, inner, &message, Color::Yellow);
            None
        }
        FetchPhase::Failure(message) => {
            render_placeholder(frame, inner, &format!("⚠ {}", message), Color::Red);
            None
        }
    }
}

fn render_placeholder(frame: &mut Frame, area: Rect, message: &str, color: Color) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(color))),
        Line::from(""),
        Line::from(Span::styled(
            "[r] Réessayer",
            Style::default().fg(Color::Gray),
        )),
    ];
    let paragraph = Paragraph::new(text).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Géométrie
// ============================================================================

/// Zones du graphique à l'intérieur de la bordure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartLayout {
    /// Zone de dessin des données
    pub plot: Rect,
    /// Colonne des labels Y, à droite du plot
    pub y_labels: Rect,
    /// Ligne de l'axe X (marques des graduations)
    pub x_ticks: Rect,
    /// Ligne des labels X
    pub x_labels: Rect,
}

/// Découpe la zone intérieure du graphique
pub fn chart_layout(inner: Rect, y_label_width: u16) -> ChartLayout {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(y_label_width)])
        .split(inner);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(columns[0]);

    ChartLayout {
        plot: rows[0],
        y_labels: Rect::new(columns[1].x, rows[0].y, columns[1].width, rows[0].height),
        x_ticks: rows[1],
        x_labels: rows[2],
    }
}

/// Zone du plot pour une zone intérieure et une largeur de labels Y
pub fn plot_area(inner: Rect, y_label_width: u16) -> Rect {
    chart_layout(inner, y_label_width).plot
}

/// Largeur utile du plot pour le résolveur de drag
///
/// Les colonnes 0..width-1 couvrent le domaine [axis_start, axis_end].
pub fn plot_width(plot: Rect) -> f64 {
    plot.width.saturating_sub(1) as f64
}

/// Largeur de la colonne des labels Y (marque + label le plus long)
fn y_label_width(axis: &ChartAxisData) -> u16 {
    let widest = axis
        .ordered_labels()
        .iter()
        .map(|(_, label)| label.chars().count())
        .max()
        .unwrap_or(0);
    (Y_TICK.chars().count() + widest) as u16
}

/// Ligne (relative au plot) où tombe une valeur Y, du haut vers le bas
fn value_row(value: f64, axis: &ChartAxisData, height: u16) -> Option<u16> {
    if height == 0 || !axis.contains(value) {
        return None;
    }
    let span = axis.span();
    if span <= 0.0 {
        return Some(0);
    }
    let fraction = (axis.axis_end - value) / span;
    Some((fraction * (height - 1) as f64).round() as u16)
}

/// Colonne (relative au plot) où tombe une position X
fn position_column(position: f64, axis: &ChartAxisData, width: u16) -> Option<u16> {
    if width == 0 || !axis.contains(position) {
        return None;
    }
    let span = axis.span();
    if span <= 0.0 {
        return Some(0);
    }
    let fraction = (position - axis.axis_start) / span;
    Some((fraction * (width - 1) as f64).round() as u16)
}

/// Lignes des labels Y, une par ligne du plot
fn y_label_lines(axis: &ChartAxisData, height: u16) -> Vec<String> {
    let mut lines = vec![String::new(); height as usize];
    for (tick, label) in axis.ordered_labels() {
        if let Some(row) = value_row(tick, axis, height) {
            lines[row as usize] = format!("{}{}", Y_TICK, label);
        }
    }
    lines
}

/// Ligne de l'axe X, avec une marque sous chaque graduation labellisée
fn x_tick_row(axis: &ChartAxisData, width: u16) -> String {
    let mut row = vec![X_AXIS_LINE; width as usize];
    for (tick, _) in axis.ordered_labels() {
        if let Some(column) = position_column(tick, axis, width) {
            row[column as usize] = X_TICK;
        }
    }
    row.into_iter().collect()
}

/// Ligne des labels X : chaque label centré sous sa graduation
///
/// Un label qui chevaucherait le précédent est omis.
fn x_label_row(axis: &ChartAxisData, width: u16) -> String {
    let width = width as usize;
    let mut row = vec![' '; width];
    let mut next_free = 0;

    for (tick, label) in axis.ordered_labels() {
        let column = match position_column(tick, axis, width as u16) {
            Some(column) => column as usize,
            None => continue,
        };
        let length = label.chars().count();
        if length > width {
            continue;
        }
        let start = column.saturating_sub(length / 2).min(width - length);
        if start < next_free {
            continue;
        }
        for (offset, c) in label.chars().enumerate() {
            row[start + offset] = c;
        }
        next_free = start + length + 1;
    }

    row.into_iter().collect()
}

// ============================================================================
// Datasets
// ============================================================================

/// Courbes de l'aire sous la ligne, de la plus haute à la plus basse
///
/// La bande k est la courbe rapprochée du plancher d'un facteur k/(bands+1).
pub fn area_gradient_bands(points: &[(f64, f64)], floor: f64, bands: usize) -> Vec<Vec<(f64, f64)>> {
    (1..=bands)
        .map(|k| {
            let keep = 1.0 - k as f64 / (bands + 1) as f64;
            points
                .iter()
                .map(|&(x, y)| (x, floor + (y - floor) * keep))
                .collect()
        })
        .collect()
}

/// Couleur de la bande k (1..=bands) : la couleur de la ligne assombrie
pub fn band_color(rgb: (u8, u8, u8), k: usize, bands: usize) -> Color {
    let t = if bands <= 1 {
        GRADIENT_FADE_START
    } else {
        GRADIENT_FADE_START
            + (GRADIENT_FADE_END - GRADIENT_FADE_START) * (k - 1) as f64 / (bands - 1) as f64
    };
    let fade = |channel: u8| (channel as f64 * (1.0 - t)).round() as u8;
    Color::Rgb(fade(rgb.0), fade(rgb.1), fade(rgb.2))
}

/// Points de la ligne horizontale en pointillés
pub fn dotted_rule(value: f64, axis: &ChartAxisData, columns: u16) -> Vec<(f64, f64)> {
    let span = axis.span();
    if columns < 2 || span <= 0.0 {
        return vec![(axis.axis_start, value)];
    }
    let step = span / (columns - 1) as f64 * RULE_DOT_SPACING;
    let count = (span / step).floor() as usize;
    (0..=count)
        .map(|i| (axis.axis_start + i as f64 * step, value))
        .collect()
}

/// Points de la ligne verticale en pointillés, un par ligne du plot
pub fn dotted_column(position: f64, axis: &ChartAxisData, rows: u16) -> Vec<(f64, f64)> {
    let span = axis.span();
    if rows < 2 || span <= 0.0 {
        return vec![(position, axis.axis_start)];
    }
    let step = span / (rows - 1) as f64;
    (0..rows)
        .map(|i| (position, axis.axis_start + i as f64 * step))
        .collect()
}

/// Lignes de grille horizontales : une par graduation Y labellisée
pub fn horizontal_gridlines(
    y_axis: &ChartAxisData,
    x_axis: &ChartAxisData,
    columns: u16,
) -> Vec<Vec<(f64, f64)>> {
    let spacing = GRID_DOT_SPACING / RULE_DOT_SPACING;
    y_axis
        .ordered_labels()
        .into_iter()
        .map(|(tick, _)| {
            dotted_rule(tick, x_axis, columns)
                .into_iter()
                .step_by(spacing as usize)
                .collect()
        })
        .collect()
}

/// Lignes de grille verticales : une par graduation X labellisée
pub fn vertical_gridlines(
    x_axis: &ChartAxisData,
    y_axis: &ChartAxisData,
    rows: u16,
) -> Vec<Vec<(f64, f64)>> {
    x_axis
        .ordered_labels()
        .into_iter()
        .map(|(tick, _)| dotted_column(tick, y_axis, rows))
        .collect()
}

fn render_chart(frame: &mut Frame, app: &App, data: &ChartViewData, inner: Rect) -> Option<Rect> {
    let layout = chart_layout(inner, y_label_width(&data.y_axis_data));
    let plot = layout.plot;
    if plot.width < 2 || plot.height < 2 {
        render_placeholder(frame, inner, "Terminal trop petit", Color::Yellow);
        return None;
    }

    let x_axis = &data.x_axis_data;
    let y_axis = &data.y_axis_data;
    let (r, g, b) = data.line_color.rgb();
    let line_color = Color::Rgb(r, g, b);

    // Les datasets empruntent leurs points : on les prépare avant
    let points = data.points();
    let mut grid = horizontal_gridlines(y_axis, x_axis, plot.width);
    grid.extend(vertical_gridlines(x_axis, y_axis, plot.height));
    let bands = area_gradient_bands(&points, y_axis.axis_start, GRADIENT_BANDS);
    let rule = data
        .previous_close_rule_mark_value
        .map(|value| dotted_rule(value, x_axis, plot.width));
    let selected = app.selected_item().map(|item| {
        let x = item.index as f64;
        (
            vec![(x, y_axis.axis_start), (x, y_axis.axis_end)],
            vec![(x, item.value)],
        )
    });

    // Ordre de dessin : du fond vers l'avant
    let mut datasets = Vec::new();
    for line in &grid {
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(Color::DarkGray))
                .data(line),
        );
    }
    for (k, band) in bands.iter().enumerate().rev() {
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(band_color((r, g, b), k + 1, GRADIENT_BANDS)))
                .data(band),
        );
    }
    if let Some(rule) = &rule {
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(Color::Gray))
                .data(rule),
        );
    }
    datasets.push(
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(line_color))
            .data(&points),
    );
    if let Some((marker, point)) = &selected {
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::DarkGray))
                .data(marker),
        );
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
                .data(point),
        );
    }

    // Axes sans labels : le widget occupe exactement la zone du plot
    let chart = Chart::new(datasets)
        .x_axis(Axis::default().bounds([x_axis.axis_start, x_axis.axis_end]))
        .y_axis(Axis::default().bounds([y_axis.axis_start, y_axis.axis_end]));
    frame.render_widget(chart, plot);

    let y_lines: Vec<Line> = y_label_lines(y_axis, layout.y_labels.height)
        .into_iter()
        .map(|label| Line::from(Span::styled(label, Style::default().fg(Color::Gray))))
        .collect();
    frame.render_widget(
        Paragraph::new(y_lines).alignment(Alignment::Left),
        layout.y_labels,
    );

    frame.render_widget(
        Paragraph::new(Span::styled(
            x_tick_row(x_axis, layout.x_ticks.width),
            Style::default().fg(Color::DarkGray),
        )),
        layout.x_ticks,
    );

    frame.render_widget(
        Paragraph::new(Span::styled(
            x_label_row(x_axis, layout.x_labels.width),
            Style::default().fg(Color::Gray),
        )),
        layout.x_labels,
    );

    Some(plot)
}

// ============================================================================
// Footer
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let line = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled(
                "Quitter ? ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw("[y/Entrée] oui  [Échap] non"),
        ])
    } else {
        let key = |k: &'static str| {
            Span::styled(k, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        };
        Line::from(vec![
            key("[h/l]"),
            Span::raw(" Période  "),
            key("[1-0]"),
            Span::raw(" Accès direct  "),
            key("[r]"),
            Span::raw(" Rafraîchir  "),
            key("[souris]"),
            Span::raw(" Glisser pour lire un point  "),
            key("[q]"),
            Span::raw(" Quitter"),
        ])
    };

    frame.render_widget(
        Paragraph::new(line).style(Style::default().fg(Color::Gray)),
        area,
    );
}

// ============================================================================
// Tests unitaires
// ============================================================================
