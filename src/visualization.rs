//! Visualization utilities for CVRP solutions.
//!
//! Generates SVG renderings of the best routes from a solver snapshot. The
//! renderer only consumes snapshot data plus instance bounds; it never
//! reaches into solver state.

use crate::heuristics::Snapshot;
use crate::instance::VrpInstance;
use std::fs;
use std::io;
use std::path::Path;

/// One color per route, cycled when the fleet is larger than the palette.
const ROUTE_COLORS: [&str; 15] = [
    "red", "green", "blue", "orange", "purple", "yellow", "cyan", "magenta", "pink", "brown",
    "black", "gray", "turquoise", "maroon", "olive",
];

/// SVG visualization generator
pub struct Visualizer {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// Margin
    pub margin: f64,
    /// Node radius
    pub node_radius: f64,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 800.0,
            margin: 50.0,
            node_radius: 6.0,
        }
    }
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the best routes of a snapshot as an SVG document.
    pub fn generate_svg(&self, instance: &VrpInstance, snapshot: &Snapshot) -> String {
        let mut svg = String::new();

        let (min_x, max_x, min_y, max_y) = self.bounds(instance);

        let scale_x = (self.width - 2.0 * self.margin) / (max_x - min_x).max(1.0);
        let scale_y = (self.height - 2.0 * self.margin) / (max_y - min_y).max(1.0);
        let scale = scale_x.min(scale_y);

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .point {{ fill: #3498db; stroke: #2c3e50; stroke-width: 1.5; }}
    .depot {{ fill: #e74c3c; stroke: #c0392b; stroke-width: 2; }}
    .route {{ stroke-width: 2; fill: none; }}
    .label {{ font-family: Arial; font-size: 10px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            self.width, self.height, self.width, self.height
        ));

        svg.push_str(&format!(
            r##"<text x="{}" y="25" class="title">Instance: {} | Iteration: {} | Best: {:.2}</text>
"##,
            self.margin, instance.name, snapshot.iteration, snapshot.best_distance
        ));

        let transform = |x: f64, y: f64| -> (f64, f64) {
            let tx = self.margin + (x - min_x) * scale;
            let ty = self.height - self.margin - (y - min_y) * scale;
            (tx, ty)
        };

        let depot = instance.depot();

        for (i, route) in snapshot.best_routes.iter().enumerate() {
            if route.is_empty() {
                continue;
            }
            let color = ROUTE_COLORS[i % ROUTE_COLORS.len()];
            let mut previous = (depot.x, depot.y);

            for point in route {
                let (x1, y1) = transform(previous.0, previous.1);
                let (x2, y2) = transform(point.x, point.y);
                svg.push_str(&format!(
                    r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" class="route" stroke="{}"/>
"#,
                    x1, y1, x2, y2, color
                ));
                previous = (point.x, point.y);
            }

            let (x1, y1) = transform(previous.0, previous.1);
            let (x2, y2) = transform(depot.x, depot.y);
            svg.push_str(&format!(
                r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" class="route" stroke="{}"/>
"#,
                x1, y1, x2, y2, color
            ));
        }

        for (id, node) in instance.nodes.iter().enumerate() {
            let (x, y) = transform(node.x, node.y);
            let class = if id == 0 { "depot" } else { "point" };
            let radius = if id == 0 {
                self.node_radius * 1.5
            } else {
                self.node_radius
            };

            svg.push_str(&format!(
                r#"<circle cx="{:.2}" cy="{:.2}" r="{}" class="{}"/>
"#,
                x, y, radius, class
            ));

            if id > 0 {
                svg.push_str(&format!(
                    r#"<text x="{:.2}" y="{:.2}" class="label">{}</text>
"#,
                    x + radius + 2.0,
                    y - 2.0,
                    node.demand
                ));
            }
        }

        svg.push_str("</svg>\n");
        svg
    }

    /// Write the SVG for a snapshot to a file.
    pub fn save_svg<P: AsRef<Path>>(
        &self,
        instance: &VrpInstance,
        snapshot: &Snapshot,
        path: P,
    ) -> io::Result<()> {
        fs::write(path, self.generate_svg(instance, snapshot))
    }

    fn bounds(&self, instance: &VrpInstance) -> (f64, f64, f64, f64) {
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for node in &instance.nodes {
            min_x = min_x.min(node.x);
            max_x = max_x.max(node.x);
            min_y = min_y.min(node.y);
            max_y = max_y.max(node.y);
        }

        (min_x, max_x, min_y, max_y)
    }
}
