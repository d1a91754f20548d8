use posemaze_game::MazeSnapshot;
use wasm_bindgen::JsCast;

use crate::ui_model::{plan_maze, DrawOp};

fn context_2d(
    canvas: &web_sys::HtmlCanvasElement,
) -> Result<web_sys::CanvasRenderingContext2d, String> {
    canvas
        .get_context("2d")
        .map_err(|_| "canvas: get_context threw".to_string())?
        .ok_or("canvas: missing 2d context".to_string())?
        .dyn_into::<web_sys::CanvasRenderingContext2d>()
        .map_err(|_| "canvas: context is not 2d".to_string())
}

pub(super) fn draw_maze(
    canvas: &web_sys::HtmlCanvasElement,
    snapshot: &MazeSnapshot,
) -> Result<(), String> {
    let ctx = context_2d(canvas)?;
    ctx.clear_rect(0.0, 0.0, canvas.width() as f64, canvas.height() as f64);
    ctx.set_line_width(1.0);

    for op in plan_maze(snapshot) {
        match op {
            DrawOp::FillRect { x, y, w, h, color } => {
                ctx.set_fill_style_str(color);
                ctx.fill_rect(x, y, w, h);
            }
            DrawOp::StrokeRect { x, y, w, h, color } => {
                ctx.set_stroke_style_str(color);
                ctx.stroke_rect(x, y, w, h);
            }
            DrawOp::Circle { cx, cy, r, color } => {
                ctx.set_fill_style_str(color);
                ctx.begin_path();
                ctx.arc(cx, cy, r, 0.0, std::f64::consts::PI * 2.0)
                    .map_err(|_| "canvas: arc threw".to_string())?;
                ctx.fill();
            }
        }
    }
    Ok(())
}
