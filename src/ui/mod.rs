/// egui views: side/top panels and the central chart.
pub mod panels;
pub mod plot;
