//! Debug panel
//!
//! Live controls for the lights plus scene and snow statistics.

use crate::gfx::{lighting::Lighting, scene::Scene};

/// Slider granularity of every light control
pub const LIGHT_STEP: f32 = 0.001;

/// Range of the moonlight position sliders
pub const MOON_POSITION_RANGE: (f32, f32) = (-5.0, 5.0);

/// Per-frame figures shown under the controls
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInfo {
    pub fps: f32,
    pub frame: u64,
    pub simulation_steps: u32,
}

/// Clamps `value` into `[min, max]` and rounds it to a multiple of `step`
pub fn snap_to_step(value: f32, min: f32, max: f32, step: f32) -> f32 {
    let clamped = value.clamp(min, max);
    if step <= 0.0 {
        return clamped;
    }
    ((clamped / step).round() * step).clamp(min, max)
}

fn stepped_slider(ui: &imgui::Ui, label: &str, min: f32, max: f32, value: &mut f32) -> bool {
    let changed = ui
        .slider_config(label, min, max)
        .display_format("%.3f")
        .build(value);
    if changed {
        *value = snap_to_step(*value, min, max, LIGHT_STEP);
    }
    changed
}

/// Light sliders; returns true if the moonlight moved
fn render_light_controls(ui: &imgui::Ui, lighting: &mut Lighting) -> bool {
    stepped_slider(ui, "Ambient", 0.0, 1.0, &mut lighting.ambient.intensity);
    stepped_slider(ui, "Moon Intensity", 0.0, 1.0, &mut lighting.moon.intensity);

    let (min, max) = MOON_POSITION_RANGE;
    let [x, y, z] = &mut lighting.moon.position;
    let mut moved = stepped_slider(ui, "Moon X", min, max, x);
    moved |= stepped_slider(ui, "Moon Y", min, max, y);
    moved |= stepped_slider(ui, "Moon Z", min, max, z);
    ui.checkbox("Moon Shadows", &mut lighting.moon.cast_shadow);
    moved
}

/// Draws the debug panel
///
/// # Arguments
/// * `ui` - ImGui UI context
/// * `scene` - Scene whose lights are edited
/// * `info` - Frame figures to display
pub fn debug_panel(ui: &imgui::Ui, scene: &mut Scene, info: FrameInfo) {
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return;
    }

    ui.window("Debug")
        .size([300.0, 260.0], imgui::Condition::FirstUseEver)
        .position([20.0, 20.0], imgui::Condition::FirstUseEver)
        .collapsible(true)
        .build(|| {
            if render_light_controls(ui, &mut scene.lighting) {
                log::debug!("Moon moved to {:?}", scene.lighting.moon.position);
            }

            ui.separator();
            let stats = scene.statistics();
            ui.text(format!("{:.0} fps, frame {}", info.fps, info.frame));
            ui.text(format!("Simulation steps this frame: {}", info.simulation_steps));
            ui.text(format!(
                "{} objects in {} groups, {} materials",
                stats.object_count, stats.group_count, stats.material_count
            ));
            ui.text(format!(
                "{} triangles, {} vertices",
                stats.total_triangles, stats.total_vertices
            ));
            ui.text(format!(
                "Snow: {} flakes, {} drift",
                stats.snowflakes, stats.drift_particles
            ));
        });
}
