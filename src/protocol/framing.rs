//! Outbound segmentation for MTU-limited writes
//!
//! Splits a payload into ordered segments no larger than the link MTU.
//! Every segment except possibly the last is exactly `mtu` bytes.

/// Number of segments `payload_len` bytes split into
pub fn segment_count(payload_len: usize, mtu: usize) -> usize {
    payload_len.div_ceil(mtu.max(1))
}

/// Iterate over the segments of `payload` in transmission order.
///
/// An empty payload yields no segments. An `mtu` of zero is treated as one.
pub fn segments(payload: &[u8], mtu: usize) -> core::slice::Chunks<'_, u8> {
    payload.chunks(mtu.max(1))
}
