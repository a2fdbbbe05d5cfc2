use crate::app::{App, Hover};
use crate::map::color::NAN_COLOR;
use crate::map::{LinearColorMapper, MapLayers};
use crate::widget::Slider;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

const SLIDER_LABEL_WIDTH: u16 = 13;
const LEGEND_SWATCH_MAX: u16 = 6;

/// Screen regions of the dashboard
#[derive(Clone, Copy, Debug)]
pub struct Areas {
    pub map: Rect,
    /// Map without its border
    pub map_inner: Rect,
    pub legend: Rect,
    pub slider_label: Rect,
    pub slider_track: Rect,
    pub status: Rect,
}

/// Split the screen: map, legend, slider, status bar
pub fn layout(area: Rect) -> Areas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(2), // Legend
            Constraint::Length(1), // Slider
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let slider = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(SLIDER_LABEL_WIDTH),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(chunks[2]);

    Areas {
        map: chunks[0],
        map_inner: chunks[0].inner(Margin::new(1, 1)),
        legend: chunks[1],
        slider_label: slider[0],
        slider_track: slider[1],
        status: chunks[3],
    }
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let areas = layout(frame.area());

    render_map(frame, app, &areas);
    frame.render_widget(Legend { mapper: &app.renderer.mapper }, areas.legend);
    render_slider(frame, &app.slider, &areas);
    render_status_bar(frame, app, areas.status);
}

fn render_map(frame: &mut Frame, app: &App, areas: &Areas) {
    let view = app.view.borrow();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {} ", view.title),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    frame.render_widget(block, areas.map);

    let inner = areas.map_inner;
    let mut viewport = app.viewport.clone();
    // Braille gives 2x4 resolution per character
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app
        .renderer
        .render(&view.source, inner.width as usize, inner.height as usize, &viewport);
    frame.render_widget(MapWidget { layers }, inner);
}

/// Filled country cells with Braille outlines drawn over them
struct MapWidget {
    layers: MapLayers,
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for cy in 0..area.height.min(self.layers.height as u16) {
            for cx in 0..area.width.min(self.layers.width as u16) {
                let fill = self.layers.fill(cx as usize, cy as usize);
                let cell = &mut buf[(area.x + cx, area.y + cy)];

                if let Some(color) = fill {
                    cell.set_bg(color);
                }
                if let Some(ch) = self.layers.outlines.glyph(cx as usize, cy as usize) {
                    let line = if fill.is_some() { Color::Black } else { Color::Gray };
                    cell.set_char(ch).set_fg(line);
                }
            }
        }
    }
}

/// Horizontal color bar with tick labels and a no-data swatch
struct Legend<'a> {
    mapper: &'a LinearColorMapper,
}

impl Widget for Legend<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 2 || self.mapper.palette.is_empty() {
            return;
        }

        let bins = self.mapper.palette.len() as u16;
        let no_data = " no data";
        let reserved = no_data.len() as u16 + 4;
        let swatch = (area.width.saturating_sub(reserved) / bins).clamp(1, LEGEND_SWATCH_MAX);
        let bar_width = swatch * bins;
        let x0 = area.x + area.width.saturating_sub(bar_width + reserved) / 2;

        for (i, color) in self.mapper.palette.iter().enumerate() {
            for k in 0..swatch {
                let x = x0 + i as u16 * swatch + k;
                if x < area.right() {
                    buf[(x, area.y)].set_char(' ').set_bg(*color);
                }
            }
        }

        // Ticks at every third bin edge
        let label_style = Style::default().fg(Color::Gray);
        for (i, edge) in self.mapper.bin_edges().enumerate().filter(|(i, _)| i % 3 == 0) {
            let label = format!("{:+.0}", edge);
            let x = (x0 + i as u16 * swatch).saturating_sub(label.len() as u16 / 2);
            buf.set_stringn(x, area.y + 1, &label, area.right().saturating_sub(x) as usize, label_style);
        }

        let nx = x0 + bar_width + 3;
        if nx + 1 < area.right() {
            buf[(nx, area.y)].set_char(' ').set_bg(NAN_COLOR);
            buf.set_stringn(nx + 1, area.y, no_data, area.right().saturating_sub(nx + 1) as usize, label_style);
        }
    }
}

fn render_slider(frame: &mut Frame, slider: &Slider, areas: &Areas) {
    let label = Line::from(vec![
        Span::styled(format!(" {}: ", slider.title), Style::default().fg(Color::DarkGray)),
        Span::styled(
            slider.value().to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(Paragraph::new(label), areas.slider_label);

    let track = areas.slider_track;
    if track.width == 0 {
        return;
    }
    let thumb = (slider.ratio() * (track.width - 1) as f64).round() as u16;
    let bar: String = (0..track.width)
        .map(|i| if i == thumb { '●' } else { '━' })
        .collect();
    frame.render_widget(Paragraph::new(bar).style(Style::default().fg(Color::Cyan)), track);
}

fn tooltip(hover: Option<&Hover>) -> Vec<Span<'static>> {
    let key = Style::default().fg(Color::DarkGray);
    match hover {
        Some(h) => vec![
            Span::styled(" Country: ", key),
            Span::styled(h.country.clone(), Style::default().fg(Color::White)),
            Span::styled(" | Temp. Anomaly: ", key),
            Span::styled(
                h.anomaly.map(|v| format!("{:.3}", v)).unwrap_or_else(|| "no data".to_string()),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(" ", key),
        ],
        None => vec![Span::styled(" hover a country ", key)],
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let hover = app.hover();
    let mut spans = tooltip(hover.as_ref());
    spans.extend([
        Span::styled("| Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(
            " | ←/→:year PgUp/PgDn:±10 hjkl:pan +/-:zoom f:fill o:outline r:reset q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_regions() {
        let areas = layout(Rect::new(0, 0, 100, 30));

        assert_eq!(areas.map.height, 26);
        assert_eq!(areas.map_inner, Rect::new(1, 1, 98, 24));
        assert_eq!(areas.legend.y, 26);
        assert_eq!(areas.slider_track, Rect::new(SLIDER_LABEL_WIDTH, 28, 100 - SLIDER_LABEL_WIDTH - 1, 1));
        assert_eq!(areas.status.y, 29);
    }

    #[test]
    fn test_tooltip_text() {
        let text = |spans: Vec<Span>| spans.iter().map(|s| s.content.to_string()).collect::<String>();

        let hover = Hover {
            country: "France".into(),
            anomaly: Some(1.23456),
        };
        assert_eq!(text(tooltip(Some(&hover))), " Country: France | Temp. Anomaly: 1.235 ");

        let missing = Hover {
            country: "France".into(),
            anomaly: None,
        };
        assert!(text(tooltip(Some(&missing))).contains("no data"));
    }

    #[test]
    fn test_legend_draws_palette() {
        let mapper = LinearColorMapper::anomaly();
        let area = Rect::new(0, 0, 80, 2);
        let mut buf = Buffer::empty(area);
        Legend { mapper: &mapper }.render(area, &mut buf);

        let colors: Vec<Color> = (0..80).map(|x| buf[(x, 0)].bg).collect();
        for color in &mapper.palette {
            assert!(colors.contains(color));
        }
        assert!(colors.contains(&NAN_COLOR));
    }
}
