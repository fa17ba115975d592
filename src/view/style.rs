use eframe::egui::Color32;

pub(super) const INTERNAL_NODE: Color32 = Color32::from_rgb(59, 130, 246);
pub(super) const EXTERNAL_NODE: Color32 = Color32::from_rgb(239, 68, 68);
pub(super) const GROUP_NODE: Color32 = Color32::from_rgb(139, 92, 246);

pub(super) const INTERNAL_EDGE: Color32 = Color32::from_rgb(148, 163, 184);
pub(super) const EXTERNAL_EDGE: Color32 = Color32::from_rgb(249, 115, 22);
pub(super) const CRITICAL_EDGE: Color32 = Color32::from_rgb(220, 38, 38);
pub(super) const GATEWAY_EDGE: Color32 = Color32::from_rgb(168, 85, 247);
pub(super) const UPSTREAM_PATH: Color32 = Color32::from_rgb(16, 185, 129);
pub(super) const DOWNSTREAM_PATH: Color32 = Color32::from_rgb(245, 158, 11);

pub(super) const SELECTED_STROKE: Color32 = Color32::from_rgb(255, 215, 0);
pub(super) const HOVER_STROKE: Color32 = Color32::from_rgb(37, 99, 235);
pub(super) const DEFAULT_STROKE: Color32 = Color32::from_rgb(30, 41, 59);

pub(super) const NODE_LABEL: Color32 = Color32::from_gray(226);
pub(super) const EDGE_LABEL: Color32 = Color32::from_gray(160);
pub(super) const ICON: Color32 = Color32::WHITE;

/// Opacity of edges outside an active path highlight.
pub(super) const DIMMED_EDGE_OPACITY: f32 = 0.15;
/// Opacity of nodes outside an active path highlight.
pub(super) const DIMMED_NODE_OPACITY: f32 = 0.3;

pub(super) fn asset_type_color(asset_type: &str) -> Option<Color32> {
    let color = match asset_type.to_ascii_lowercase().as_str() {
        "server" => Color32::from_rgb(37, 99, 235),
        "workstation" => Color32::from_rgb(14, 165, 233),
        "database" => Color32::from_rgb(22, 163, 74),
        "router" | "switch" => Color32::from_rgb(202, 138, 4),
        "firewall" => Color32::from_rgb(220, 38, 38),
        "load_balancer" => Color32::from_rgb(219, 39, 119),
        "container" => Color32::from_rgb(13, 148, 136),
        "cloud" => Color32::from_rgb(100, 116, 139),
        _ => return None,
    };
    Some(color)
}

/// One- or two-letter glyph drawn inside a node when zoomed in enough.
pub(super) fn asset_type_icon(asset_type: &str) -> Option<&'static str> {
    let icon = match asset_type.to_ascii_lowercase().as_str() {
        "server" => "S",
        "workstation" => "W",
        "database" => "DB",
        "router" => "R",
        "switch" => "SW",
        "firewall" => "FW",
        "load_balancer" => "LB",
        "container" => "C",
        "cloud" => "CL",
        _ => return None,
    };
    Some(icon)
}
