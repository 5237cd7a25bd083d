//! Grid metadata. Every query needs an initialized instance.
//!
//! Array queries write into a caller buffer of `len` elements and fail
//! with `BufferTooSmall` if it cannot hold the result. Queries that do
//! not apply to the grid's topology fail with `GridCapabilityUnsupported`.

#![allow(unsafe_code)]

use std::ffi::c_char;

use bmi_catalog::{CatalogError, Grid};
use bmi_core::GridId;

use crate::buffer::{self, c_int, FfiResult};
use crate::instance::with_adapter;
use crate::status::BmiStatus;

fn with_grid(grid: i32, f: impl FnOnce(&Grid) -> FfiResult) -> i32 {
    with_adapter(|a| f(a.catalog().grid(GridId(grid))?))
}

fn grid_int(grid: i32, out: *mut i32, query: fn(&Grid) -> Result<usize, CatalogError>) -> i32 {
    with_grid(grid, |g| {
        let value = c_int(query(g)?)?;
        // SAFETY: out is valid for one write per caller contract.
        unsafe { buffer::write_out(out, value) }
    })
}

fn grid_reals(
    grid: i32,
    out: *mut f64,
    len: usize,
    query: fn(&Grid) -> Result<&[f64], CatalogError>,
) -> i32 {
    with_grid(grid, |g| {
        let values = query(g)?;
        // SAFETY: out is valid for len elements per caller contract.
        unsafe { buffer::write_slice(out, len, values) }
    })
}

fn grid_ints(
    grid: i32,
    out: *mut i32,
    len: usize,
    query: fn(&Grid) -> Result<&[i32], CatalogError>,
) -> i32 {
    with_grid(grid, |g| {
        let values = query(g)?;
        // SAFETY: out is valid for len elements per caller contract.
        unsafe { buffer::write_slice(out, len, values) }
    })
}

/// Topology name, e.g. `"uniform_rectilinear"`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_grid_type(grid: i32, buf: *mut c_char, len: usize) -> i32 {
    ffi_guard!({
        with_grid(grid, |g| {
            // SAFETY: buf is valid for len bytes per caller contract.
            unsafe { buffer::write_c_str(buf, len, g.kind().bmi_name()) }
        })
    })
}

/// Number of dimensions.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_grid_rank(grid: i32, out: *mut i32) -> i32 {
    ffi_guard!({ grid_int(grid, out, |g| Ok(g.rank())) })
}

/// Total number of elements.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_grid_size(grid: i32, out: *mut i32) -> i32 {
    ffi_guard!({ grid_int(grid, out, |g| Ok(g.size())) })
}

/// Nodes per axis, slowest varying first. Rectilinear grids only.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_grid_shape(grid: i32, out: *mut i32, len: usize) -> i32 {
    ffi_guard!({
        with_grid(grid, |g| {
            let shape = g
                .shape()?
                .iter()
                .map(|&n| c_int(n))
                .collect::<Result<Vec<i32>, BmiStatus>>()?;
            // SAFETY: out is valid for len elements per caller contract.
            unsafe { buffer::write_slice(out, len, &shape) }
        })
    })
}

/// Node spacing per axis. Rectilinear grids only.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_grid_spacing(grid: i32, out: *mut f64, len: usize) -> i32 {
    ffi_guard!({ grid_reals(grid, out, len, Grid::spacing) })
}

/// First node coordinate per axis. Rectilinear grids only.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_grid_origin(grid: i32, out: *mut f64, len: usize) -> i32 {
    ffi_guard!({ grid_reals(grid, out, len, Grid::origin) })
}

/// Node x coordinates. Point and unstructured grids only.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_grid_x(grid: i32, out: *mut f64, len: usize) -> i32 {
    ffi_guard!({ grid_reals(grid, out, len, Grid::x) })
}

/// Node y coordinates. Point and unstructured grids only.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_grid_y(grid: i32, out: *mut f64, len: usize) -> i32 {
    ffi_guard!({ grid_reals(grid, out, len, Grid::y) })
}

/// Node z coordinates, where the grid has them.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_grid_z(grid: i32, out: *mut f64, len: usize) -> i32 {
    ffi_guard!({ grid_reals(grid, out, len, Grid::z) })
}

/// Node count of an unstructured grid.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_grid_node_count(grid: i32, out: *mut i32) -> i32 {
    ffi_guard!({ grid_int(grid, out, Grid::node_count) })
}

/// Edge count of an unstructured grid.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_grid_edge_count(grid: i32, out: *mut i32) -> i32 {
    ffi_guard!({ grid_int(grid, out, Grid::edge_count) })
}

/// Face count of an unstructured grid.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_grid_face_count(grid: i32, out: *mut i32) -> i32 {
    ffi_guard!({ grid_int(grid, out, Grid::face_count) })
}

/// Node pairs, one per edge.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_grid_edge_nodes(grid: i32, out: *mut i32, len: usize) -> i32 {
    ffi_guard!({ grid_ints(grid, out, len, Grid::edge_nodes) })
}

/// Face node lists, concatenated.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_grid_face_nodes(grid: i32, out: *mut i32, len: usize) -> i32 {
    ffi_guard!({ grid_ints(grid, out, len, Grid::face_nodes) })
}

/// Node count of each face.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_grid_nodes_per_face(grid: i32, out: *mut i32, len: usize) -> i32 {
    ffi_guard!({ grid_ints(grid, out, len, Grid::nodes_per_face) })
}
