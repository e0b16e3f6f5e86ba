use std::collections::BTreeMap;

use eframe::egui::{Color32, PointerButton, Response, ScrollArea, Stroke, Ui};
use egui_plot::{Line, Plot, PlotPoints, PlotTransform, Polygon};

use crate::config::PlotLayout;

use crate::data::display::{DisplayOptions, WiggleTrace, wiggle_traces};
use crate::data::model::Gather;
use crate::picking::mapping::CoordinateMapper;
use crate::picking::session::{ClickEvent, ClickKind, PickRenderer};
use crate::state::AppState;

const PICK_COLOR: Color32 = Color32::RED;

// ---------------------------------------------------------------------------
// PlotScene – retained geometry the immediate-mode plot draws every frame
// ---------------------------------------------------------------------------

/// What the gather plot shows: wiggle geometry plus one marker per pick.
#[derive(Debug, Default)]
pub struct PlotScene {
    display: DisplayOptions,
    traces: Vec<WiggleTrace>,
    markers: BTreeMap<usize, f64>,
    title: String,
}

impl PlotScene {
    pub fn new(display: DisplayOptions) -> Self {
        Self {
            display,
            ..Self::default()
        }
    }

    /// Change amplitude conditioning; takes effect on the next `render`.
    pub fn set_display(&mut self, display: DisplayOptions) {
        self.display = display;
    }

    pub fn traces(&self) -> &[WiggleTrace] {
        &self.traces
    }

    pub fn markers(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.markers.iter().map(|(&r, &t)| (r, t))
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

impl PickRenderer for PlotScene {
    fn render(&mut self, gather: &Gather) {
        self.traces = wiggle_traces(gather, &self.display);
        self.markers.clear();
        self.title = gather.label.clone();
    }

    fn draw_marker(&mut self, receiver: usize, time: f64) {
        self.markers.insert(receiver, time);
    }

    fn erase_marker(&mut self, receiver: usize) {
        self.markers.remove(&receiver);
    }
}

// ---------------------------------------------------------------------------
// Gather plot (central panel)
// ---------------------------------------------------------------------------

/// Render the gather in the chosen layout and forward clicks to the pick session.
pub fn gather_plot(ui: &mut Ui, state: &mut AppState) {
    let Some(mapper) = state.mapper() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Import a directory of gathers  (File → Import directory…)");
        });
        return;
    };

    let click = match state.config.layout {
        PlotLayout::Gather => wiggle_plot(ui, state.session.renderer(), mapper),
        PlotLayout::Traces => trace_plots(ui, state.session.renderer(), mapper),
    };
    if let Some(event) = click {
        state.handle_click(event);
    }
}

/// All traces side by side, receiver along x and time growing downward.
fn wiggle_plot(ui: &mut Ui, scene: &PlotScene, mapper: CoordinateMapper) -> Option<ClickEvent> {
    let trace_color = ui.visuals().text_color();
    let receivers = scene.traces().len();
    let (top, bottom) = mapper.y_span();

    ui.label(scene.title());

    let response = Plot::new("gather_plot")
        .x_axis_label("Receiver")
        .y_axis_label(mapper.unit().axis_label())
        .y_axis_formatter(move |mark, _range| mapper.format_y(mark.value))
        .label_formatter(move |_name, value| {
            let receiver = mapper.receiver_from_x(value.x);
            format!("Receiver {receiver}\n{}", mapper.format_y(value.y))
        })
        .include_x(-1.0)
        .include_x(receivers as f64)
        .include_y(top)
        .include_y(bottom)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for tr in scene.traces() {
                let points: PlotPoints = tr
                    .line
                    .iter()
                    .map(|&[x, s]| [x, mapper.y_from_position(s)])
                    .collect();
                plot_ui.line(Line::new(points).color(trace_color).width(0.5));

                for piece in &tr.fill {
                    let corners: PlotPoints = piece
                        .iter()
                        .map(|&[x, s]| [x, mapper.y_from_position(s)])
                        .collect();
                    plot_ui.polygon(
                        Polygon::new(corners)
                            .fill_color(trace_color)
                            .stroke(Stroke::NONE),
                    );
                }
            }

            for (r, t) in scene.markers() {
                let x = r as f64;
                let y = mapper.y_from_time(t);
                let marker: PlotPoints = vec![[x - 0.5, y], [x + 0.5, y]].into();
                plot_ui.line(Line::new(marker).color(PICK_COLOR).width(1.5));
            }
        });

    let (kind, value) = clicked_value(&response.response, &response.transform)?;
    let (receiver, time) = mapper.pick_from_plot(value[0], value[1]);
    Some(ClickEvent {
        kind,
        receiver,
        time,
    })
}

/// One small plot per trace, time along x and amplitude along y.
fn trace_plots(ui: &mut Ui, scene: &PlotScene, mapper: CoordinateMapper) -> Option<ClickEvent> {
    let trace_color = ui.visuals().text_color();
    let markers: BTreeMap<usize, f64> = scene.markers().collect();
    let (top, bottom) = mapper.y_span();
    let mut click = None;

    ui.label(scene.title());

    ScrollArea::vertical()
        .id_salt("trace_plots")
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for tr in scene.traces() {
                let r = tr.receiver;
                let base = r as f64;
                let pick = markers.get(&r).copied();

                ui.label(trace_title(&mapper, r, pick));
                let response = Plot::new(("trace_plot", r))
                    .height(120.0)
                    .x_axis_label(mapper.unit().axis_label())
                    .x_axis_formatter(move |mark, _range| mapper.format_y(-mark.value))
                    .show_y(false)
                    .include_x(-top)
                    .include_x(-bottom)
                    .include_y(-1.0)
                    .include_y(1.0)
                    .allow_boxed_zoom(true)
                    .allow_drag(true)
                    .allow_scroll(false)
                    .allow_zoom(true)
                    .show(ui, |plot_ui| {
                        let points: PlotPoints = tr
                            .line
                            .iter()
                            .map(|&[x, s]| [-mapper.y_from_position(s), x - base])
                            .collect();
                        plot_ui.line(Line::new(points).color(trace_color).width(0.8));

                        for piece in &tr.fill {
                            let corners: PlotPoints = piece
                                .iter()
                                .map(|&[x, s]| [-mapper.y_from_position(s), x - base])
                                .collect();
                            plot_ui.polygon(
                                Polygon::new(corners)
                                    .fill_color(trace_color)
                                    .stroke(Stroke::NONE),
                            );
                        }

                        if let Some(t) = pick {
                            let x = -mapper.y_from_time(t);
                            let marker: PlotPoints = vec![[x, -1.0], [x, 1.0]].into();
                            plot_ui.line(Line::new(marker).color(PICK_COLOR).width(1.5));
                        }
                    });

                let clicked = clicked_value(&response.response, &response.transform);
                if let Some((kind, value)) = clicked {
                    let (_, time) = mapper.pick_from_plot(base, -value[0]);
                    click = Some(ClickEvent {
                        kind,
                        receiver: r,
                        time,
                    });
                }
            }
        });

    click
}

/// Caption above a single-trace plot.
fn trace_title(mapper: &CoordinateMapper, receiver: usize, pick: Option<f64>) -> String {
    match pick {
        Some(t) => format!(
            "Receiver {receiver}  ·  Pick = {}",
            mapper.format_y(mapper.y_from_time(t))
        ),
        None => format!("Receiver {receiver}"),
    }
}

/// Button and plot coordinates of a click on `response`, if any.
fn clicked_value(response: &Response, transform: &PlotTransform) -> Option<(ClickKind, [f64; 2])> {
    let button = [
        PointerButton::Primary,
        PointerButton::Middle,
        PointerButton::Secondary,
    ]
    .into_iter()
    .find(|&b| response.clicked_by(b))?;
    let kind = ClickKind::from_pointer(button)?;
    let pos = response.interact_pointer_pos()?;
    let value = transform.value_from_position(pos);
    Some((kind, [value.x, value.y]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Trace;
    use crate::picking::mapping::format_seconds;

    #[test]
    fn scene_tracks_markers_and_clears_on_render() {
        let gather = Gather::new(vec![Trace::new(vec![0.0, 1.0]); 2], 10.0).with_label("shot.json");
        let mut scene = PlotScene::default();
        scene.render(&gather);
        assert_eq!(scene.traces().len(), 2);
        assert_eq!(scene.title(), "shot.json");

        scene.draw_marker(1, 0.1);
        scene.draw_marker(1, 0.0);
        scene.draw_marker(0, 0.1);
        assert_eq!(scene.markers().collect::<Vec<_>>(), vec![(0, 0.1), (1, 0.0)]);

        scene.erase_marker(0);
        scene.erase_marker(5);
        assert_eq!(scene.markers().count(), 1);

        scene.render(&gather);
        assert_eq!(scene.markers().count(), 0);
    }

    #[test]
    fn fill_follows_display_options() {
        let gather = Gather::new(vec![Trace::new(vec![0.0, 1.0, 0.0])], 10.0);
        let mut scene = PlotScene::new(DisplayOptions {
            fill: true,
            demean: false,
            ..DisplayOptions::default()
        });
        scene.render(&gather);
        assert!(!scene.traces()[0].fill.is_empty());

        scene.set_display(DisplayOptions::default());
        scene.render(&gather);
        assert!(scene.traces()[0].fill.is_empty());
    }

    #[test]
    fn trace_title_shows_pick_in_display_unit() {
        use crate::picking::mapping::{Delay, TimeUnit};

        let gather = Gather::new(vec![Trace::new(vec![0.0; 100]); 3], 100.0);
        let samples = CoordinateMapper::new(&gather, TimeUnit::Samples, &Delay::default(), false);
        assert_eq!(trace_title(&samples, 2, None), "Receiver 2");
        assert_eq!(trace_title(&samples, 1, Some(0.42)), "Receiver 1  ·  Pick = 42");

        let seconds = CoordinateMapper::new(&gather, TimeUnit::Seconds, &Delay::default(), false);
        assert_eq!(
            trace_title(&seconds, 1, Some(0.42)),
            format!("Receiver 1  ·  Pick = {}", format_seconds(0.42))
        );
    }
}
