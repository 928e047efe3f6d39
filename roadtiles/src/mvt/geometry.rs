//! MVT geometry command stream decoding.
//!
//! A geometry is a sequence of `(id, count)` command integers followed by
//! zigzag-encoded parameter pairs. Coordinates are deltas from the previous
//! cursor position, in tile-local pixel space `0..extent`.

const CMD_MOVE_TO: u32 = 1;
const CMD_LINE_TO: u32 = 2;
const CMD_CLOSE_PATH: u32 = 7;

/// Decode a command stream into rings of absolute tile-pixel points.
///
/// Every `MoveTo` starts a new ring; `ClosePath` repeats the ring's first
/// point. Truncated parameter lists end decoding of that command and
/// unknown command ids end decoding entirely; whatever was decoded so far
/// is returned.
pub fn decode_rings(commands: &[u32]) -> Vec<Vec<(i32, i32)>> {
    let mut rings: Vec<Vec<(i32, i32)>> = Vec::new();
    let mut ring: Vec<(i32, i32)> = Vec::new();
    let mut cursor = 0usize;
    let mut x = 0i32;
    let mut y = 0i32;

    while cursor < commands.len() {
        let command = commands[cursor];
        cursor += 1;
        let id = command & 0x7;
        let count = command >> 3;
        match id {
            CMD_MOVE_TO | CMD_LINE_TO => {
                for _ in 0..count {
                    if cursor + 1 >= commands.len() {
                        break;
                    }
                    x = x.wrapping_add(decode_zigzag(commands[cursor]));
                    y = y.wrapping_add(decode_zigzag(commands[cursor + 1]));
                    cursor += 2;
                    if id == CMD_MOVE_TO && !ring.is_empty() {
                        rings.push(std::mem::take(&mut ring));
                    }
                    ring.push((x, y));
                }
            }
            CMD_CLOSE_PATH => {
                if let Some(first) = ring.first().copied() {
                    ring.push(first);
                }
            }
            _ => break,
        }
    }
    if !ring.is_empty() {
        rings.push(ring);
    }
    rings
}

/// Zigzag-decode one parameter integer.
#[inline]
pub fn decode_zigzag(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Zigzag-encode one parameter integer.
#[inline]
pub fn encode_zigzag(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

fn command(id: u32, count: u32) -> u32 {
    (count << 3) | (id & 0x7)
}

/// Encode a single polyline as `MoveTo` + `LineTo` commands.
///
/// Used to build fixture tiles; an empty slice yields an empty stream.
pub fn encode_line(points: &[(i32, i32)]) -> Vec<u32> {
    let Some((&first, rest)) = points.split_first() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(3 + rest.len() * 2 + 1);
    out.push(command(CMD_MOVE_TO, 1));
    out.push(encode_zigzag(first.0));
    out.push(encode_zigzag(first.1));

    if !rest.is_empty() {
        out.push(command(CMD_LINE_TO, rest.len() as u32));
        let mut prev = first;
        for &point in rest {
            out.push(encode_zigzag(point.0 - prev.0));
            out.push(encode_zigzag(point.1 - prev.1));
            prev = point;
        }
    }
    out
}
