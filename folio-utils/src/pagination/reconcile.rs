//! Diffing the controls shown on a surface against the ones that should be.

use super::surface::{ActorId, RenderedControl, Surface, SurfaceError, SurfaceId};

/// One surface mutation needed to converge the controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlOp {
    /// Remove a control entirely.
    Remove { symbol: String },
    /// Remove another actor's press from a control that stays.
    Strip { symbol: String, actor: ActorId },
    /// Append a control.
    Add { symbol: String },
}

/// Plan the operations that turn `rendered` into exactly `expected`, in order.
///
/// Walks the rendered controls left to right. A control is kept only when it
/// is our own and matches the next expected symbol; everything else is
/// removed. Expected symbols left over are appended, so a control that sits
/// out of order is removed and re-added at the end.
pub fn plan_reconciliation(rendered: &[RenderedControl], expected: &[String]) -> Vec<ControlOp> {
    let mut remaining = expected.iter().peekable();
    let mut ops = Vec::with_capacity(rendered.len() + expected.len());

    for control in rendered {
        match remaining.peek() {
            Some(next) if control.mine && control.symbol == **next => {
                remaining.next();
                ops.extend(control.foreign.iter().map(|actor| ControlOp::Strip {
                    symbol: control.symbol.clone(),
                    actor: *actor,
                }));
            }
            _ => ops.push(ControlOp::Remove {
                symbol: control.symbol.clone(),
            }),
        }
    }

    ops.extend(remaining.map(|symbol| ControlOp::Add {
        symbol: symbol.clone(),
    }));

    ops
}

/// Apply planned operations in order, stopping at the first failure.
pub async fn apply_plan(
    surface: &dyn Surface,
    surface_id: SurfaceId,
    ops: &[ControlOp],
) -> Result<(), SurfaceError> {
    for op in ops {
        match op {
            ControlOp::Remove { symbol } => surface.remove_control(surface_id, symbol, None).await?,
            ControlOp::Strip { symbol, actor } => {
                surface
                    .remove_control(surface_id, symbol, Some(*actor))
                    .await?
            }
            ControlOp::Add { symbol } => surface.add_control(surface_id, symbol).await?,
        }
    }
    Ok(())
}
