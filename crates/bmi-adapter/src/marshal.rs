//! Copying between engine storage and caller buffers.
//!
//! Caller buffers are flat and in canonical (row-major) order; engine
//! storage is whatever its [`Layout`] says. Reads may widen native
//! `f32`/`i32` to `f64`; writes may narrow `f64` into native `f32`. Every
//! other pairing must match exactly.
//!
//! These functions assume the caller already validated the buffer against
//! the catalog. What they check is storage consistency: a mismatch here
//! means the engine's arrays disagree with its own metadata.

use bmi_core::{
    Layout, NativeArray, NativeArrayMut, NativeData, NativeDataMut, ValueSlice, ValueSliceMut,
    WritePolicy,
};

use crate::error::MarshalError;

fn gather<S: Copy, D>(src: &[S], layout: &Layout, dest: &mut [D], conv: impl Fn(S) -> D) {
    if layout.is_contiguous() {
        let start = layout.offset();
        for (d, &s) in dest.iter_mut().zip(&src[start..start + layout.len()]) {
            *d = conv(s);
        }
    } else {
        for (d, off) in dest.iter_mut().zip(layout.offsets()) {
            *d = conv(src[off]);
        }
    }
}

fn gather_at<S: Copy, D>(
    src: &[S],
    layout: &Layout,
    indices: &[usize],
    dest: &mut [D],
    conv: impl Fn(S) -> D,
) {
    for (d, &i) in dest.iter_mut().zip(indices) {
        *d = conv(src[layout.offset_of(i)]);
    }
}

fn scatter<S: Copy, D>(dst: &mut [D], layout: &Layout, src: &[S], put: impl Fn(&mut D, S)) {
    if layout.is_contiguous() {
        let start = layout.offset();
        for (d, &s) in dst[start..start + layout.len()].iter_mut().zip(src) {
            put(d, s);
        }
    } else {
        for (off, &s) in layout.offsets().zip(src) {
            put(&mut dst[off], s);
        }
    }
}

fn scatter_at<S: Copy, D>(
    dst: &mut [D],
    layout: &Layout,
    indices: &[usize],
    src: &[S],
    put: impl Fn(&mut D, S),
) {
    for (&i, &s) in indices.iter().zip(src) {
        put(&mut dst[layout.offset_of(i)], s);
    }
}

fn check_len(native: usize, exposed: usize) -> Result<(), MarshalError> {
    if native == exposed {
        Ok(())
    } else {
        Err(MarshalError::Length { native, exposed })
    }
}

fn check_indices(indices: &[usize], len: usize) -> Result<(), MarshalError> {
    match indices.iter().find(|&&i| i >= len) {
        Some(&index) => Err(MarshalError::Index { index, len }),
        None => Ok(()),
    }
}

/// Copy all of `src` into `dest` in canonical order.
pub fn read_into(src: &NativeArray<'_>, dest: ValueSliceMut<'_>) -> Result<(), MarshalError> {
    check_len(src.len(), dest.len())?;
    let layout = src.layout();
    match (src.data(), dest) {
        (NativeData::Float64(s), ValueSliceMut::Float64(d)) if layout.is_contiguous() => {
            let start = layout.offset();
            d.copy_from_slice(&s[start..start + d.len()]);
        }
        (NativeData::Float32(s), ValueSliceMut::Float32(d)) if layout.is_contiguous() => {
            let start = layout.offset();
            d.copy_from_slice(&s[start..start + d.len()]);
        }
        (NativeData::Int32(s), ValueSliceMut::Int32(d)) if layout.is_contiguous() => {
            let start = layout.offset();
            d.copy_from_slice(&s[start..start + d.len()]);
        }
        (NativeData::Float64(s), ValueSliceMut::Float64(d)) => gather(s, layout, d, |v| v),
        (NativeData::Float32(s), ValueSliceMut::Float32(d)) => gather(s, layout, d, |v| v),
        (NativeData::Int32(s), ValueSliceMut::Int32(d)) => gather(s, layout, d, |v| v),
        (NativeData::Float32(s), ValueSliceMut::Float64(d)) => gather(s, layout, d, f64::from),
        (NativeData::Int32(s), ValueSliceMut::Float64(d)) => gather(s, layout, d, f64::from),
        (native, dest) => {
            return Err(MarshalError::Conversion {
                native: native.value_type(),
                exposed: dest.value_type(),
            })
        }
    }
    Ok(())
}

/// Copy the elements at canonical `indices` of `src` into `dest`.
pub fn read_at(
    src: &NativeArray<'_>,
    indices: &[usize],
    dest: ValueSliceMut<'_>,
) -> Result<(), MarshalError> {
    check_len(indices.len(), dest.len())?;
    check_indices(indices, src.len())?;
    let layout = src.layout();
    match (src.data(), dest) {
        (NativeData::Float64(s), ValueSliceMut::Float64(d)) => {
            gather_at(s, layout, indices, d, |v| v)
        }
        (NativeData::Float32(s), ValueSliceMut::Float32(d)) => {
            gather_at(s, layout, indices, d, |v| v)
        }
        (NativeData::Int32(s), ValueSliceMut::Int32(d)) => gather_at(s, layout, indices, d, |v| v),
        (NativeData::Float32(s), ValueSliceMut::Float64(d)) => {
            gather_at(s, layout, indices, d, f64::from)
        }
        (NativeData::Int32(s), ValueSliceMut::Float64(d)) => {
            gather_at(s, layout, indices, d, f64::from)
        }
        (native, dest) => {
            return Err(MarshalError::Conversion {
                native: native.value_type(),
                exposed: dest.value_type(),
            })
        }
    }
    Ok(())
}

/// Write `src` over (or onto) the whole of `dst`.
pub fn write_from(
    dst: &mut NativeArrayMut<'_>,
    src: ValueSlice<'_>,
    policy: WritePolicy,
) -> Result<(), MarshalError> {
    check_len(dst.len(), src.len())?;
    let (data, layout) = dst.parts();
    let add = policy == WritePolicy::Accumulate;
    match (data, src) {
        (NativeDataMut::Float64(d), ValueSlice::Float64(s)) if !add && layout.is_contiguous() => {
            let start = layout.offset();
            d[start..start + s.len()].copy_from_slice(s);
        }
        (NativeDataMut::Float64(d), ValueSlice::Float64(s)) if add => {
            scatter(d, layout, s, |d, s| *d += s)
        }
        (NativeDataMut::Float64(d), ValueSlice::Float64(s)) => scatter(d, layout, s, |d, s| *d = s),
        (NativeDataMut::Float32(d), ValueSlice::Float32(s)) if add => {
            scatter(d, layout, s, |d, s| *d += s)
        }
        (NativeDataMut::Float32(d), ValueSlice::Float32(s)) => scatter(d, layout, s, |d, s| *d = s),
        (NativeDataMut::Float32(d), ValueSlice::Float64(s)) if add => {
            scatter(d, layout, s, |d, s| *d += s as f32)
        }
        (NativeDataMut::Float32(d), ValueSlice::Float64(s)) => {
            scatter(d, layout, s, |d, s| *d = s as f32)
        }
        (NativeDataMut::Int32(d), ValueSlice::Int32(s)) if add => {
            scatter(d, layout, s, |d, s| *d = d.saturating_add(s))
        }
        (NativeDataMut::Int32(d), ValueSlice::Int32(s)) => scatter(d, layout, s, |d, s| *d = s),
        (native, src) => {
            return Err(MarshalError::Conversion {
                native: native.value_type(),
                exposed: src.value_type(),
            })
        }
    }
    Ok(())
}

/// Write `src` to the elements at canonical `indices` of `dst`.
pub fn write_at(
    dst: &mut NativeArrayMut<'_>,
    indices: &[usize],
    src: ValueSlice<'_>,
    policy: WritePolicy,
) -> Result<(), MarshalError> {
    check_len(indices.len(), src.len())?;
    check_indices(indices, dst.len())?;
    let (data, layout) = dst.parts();
    let add = policy == WritePolicy::Accumulate;
    match (data, src) {
        (NativeDataMut::Float64(d), ValueSlice::Float64(s)) if add => {
            scatter_at(d, layout, indices, s, |d, s| *d += s)
        }
        (NativeDataMut::Float64(d), ValueSlice::Float64(s)) => {
            scatter_at(d, layout, indices, s, |d, s| *d = s)
        }
        (NativeDataMut::Float32(d), ValueSlice::Float32(s)) if add => {
            scatter_at(d, layout, indices, s, |d, s| *d += s)
        }
        (NativeDataMut::Float32(d), ValueSlice::Float32(s)) => {
            scatter_at(d, layout, indices, s, |d, s| *d = s)
        }
        (NativeDataMut::Float32(d), ValueSlice::Float64(s)) if add => {
            scatter_at(d, layout, indices, s, |d, s| *d += s as f32)
        }
        (NativeDataMut::Float32(d), ValueSlice::Float64(s)) => {
            scatter_at(d, layout, indices, s, |d, s| *d = s as f32)
        }
        (NativeDataMut::Int32(d), ValueSlice::Int32(s)) if add => {
            scatter_at(d, layout, indices, s, |d, s| *d = d.saturating_add(s))
        }
        (NativeDataMut::Int32(d), ValueSlice::Int32(s)) => {
            scatter_at(d, layout, indices, s, |d, s| *d = s)
        }
        (native, src) => {
            return Err(MarshalError::Conversion {
                native: native.value_type(),
                exposed: src.value_type(),
            })
        }
    }
    Ok(())
}
