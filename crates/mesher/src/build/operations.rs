//! Operation table: maps each protocol operation onto kernel calls.

use std::collections::HashMap;

use glam::{DAffine3, DVec3};
use shared::{Operation, SurfaceInfo};

use super::mesh_extraction::MeshExtractor;
use super::query::query_surface;
use crate::error::{MeshError, Result};
use crate::kernel::{KernelError, Modeler};
use crate::settings::MesherSettings;

/// What an operation produced
#[derive(Debug)]
pub enum Outcome<S> {
    /// New shape to mesh and store under the request name
    Shape(S),
    /// Name to drop from the shape table
    Removed(String),
    Surface(SurfaceInfo),
}

fn lookup<S: Clone>(shapes: &HashMap<String, S>, name: &str) -> Result<S> {
    shapes
        .get(name)
        .cloned()
        .ok_or_else(|| MeshError::UnknownShape(name.to_string()))
}

fn lookup_all<S: Clone>(shapes: &HashMap<String, S>, names: &[String]) -> Result<Vec<S>> {
    names.iter().map(|n| lookup(shapes, n)).collect()
}

/// Rotation by `degrees` about the line through `origin` along `axis`
pub fn rotation_about(origin: DVec3, axis: DVec3, degrees: f64) -> Result<DAffine3> {
    let axis = axis
        .try_normalize()
        .ok_or_else(|| KernelError::InvalidArgument(format!("rotation axis {axis} has no direction")))?;
    Ok(DAffine3::from_translation(origin)
        * DAffine3::from_axis_angle(axis, degrees.to_radians())
        * DAffine3::from_translation(-origin))
}

/// Runs one operation against the kernel. Never mutates `shapes`.
pub fn apply<K: Modeler>(
    kernel: &K,
    shapes: &HashMap<String, K::Shape>,
    extractor: &mut MeshExtractor,
    settings: &MesherSettings,
    operation: &Operation,
) -> Result<Outcome<K::Shape>> {
    let v = DVec3::from_array;
    let shape = match operation {
        Operation::MakeBox { origin, size } => kernel.make_box(v(*origin), v(*size))?,
        Operation::MakeCylinder { center, radius, height } => kernel.make_cylinder(v(*center), *radius, *height)?,
        Operation::MakeSphere { center, radius } => kernel.make_sphere(v(*center), *radius)?,
        Operation::MakeLine { start, end } => kernel.make_line(v(*start), v(*end))?,
        Operation::MakeCircle { center, radius } => kernel.make_circle(v(*center), *radius)?,
        Operation::Translate { shape, offset } => {
            kernel.transform(&lookup(shapes, shape)?, DAffine3::from_translation(v(*offset)))?
        }
        Operation::Rotate {
            shape,
            origin,
            axis,
            degrees,
        } => kernel.transform(&lookup(shapes, shape)?, rotation_about(v(*origin), v(*axis), *degrees)?)?,
        Operation::Copy { shape } => kernel.copy(&lookup(shapes, shape)?)?,
        Operation::Compound { shapes: names } => kernel.compound(&lookup_all(shapes, names)?)?,
        Operation::Fuse { shapes: names } => kernel.fuse(&lookup_all(shapes, names)?)?,
        Operation::Cut { target, tools } => kernel.cut(&lookup(shapes, target)?, &lookup_all(shapes, tools)?)?,
        Operation::Fillet { shape, radius, edges } => {
            let target = lookup(shapes, shape)?;
            // Edge indices are the ones the last extraction of this shape emitted
            let unique = extractor.unique_edges(kernel, &target, settings);
            let selected = edges
                .iter()
                .map(|&i| {
                    unique.get(i as usize).cloned().ok_or_else(|| {
                        KernelError::InvalidArgument(format!("shape '{shape}' has no edge {i}"))
                    })
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            kernel.fillet(&target, *radius, &selected)?
        }
        Operation::Offset { shape, distance } => kernel.offset(&lookup(shapes, shape)?, *distance)?,
        Operation::Remove { shape } => return Ok(Outcome::Removed(shape.clone())),
        Operation::QuerySurface {
            shape,
            face_index,
            u,
            v,
            uv_bounds,
        } => {
            let target = lookup(shapes, shape)?;
            let info = query_surface(kernel, shape, &target, *face_index, *u, *v, *uv_bounds)?;
            return Ok(Outcome::Surface(info));
        }
    };
    Ok(Outcome::Shape(shape))
}
