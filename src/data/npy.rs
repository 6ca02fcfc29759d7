//! Minimal NumPy `.npy` v1.0 reader/writer for little-endian f64 arrays in
//! C order, the only layout the studio exchanges with its frontend.
//!
//! # File layout
//! ```text
//! bytes 0-5:   0x93 'N' 'U' 'M' 'P' 'Y'   (magic)
//! byte  6:     major version (0x01)
//! byte  7:     minor version (0x00)
//! bytes 8-9:   header length H, little-endian u16
//! bytes 10..10+H: ASCII dict literal, space-padded, terminated by '\n':
//!              {'descr': '<f8', 'fortran_order': False, 'shape': (50, 3), }
//! bytes 10+H.. : product(shape) little-endian f64 values, C order
//! ```
//! The writer pads the header so the data section starts on a 64-byte
//! boundary.

const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Parses a `.npy` byte buffer into `(shape, values)`.
pub fn parse_npy(bytes: &[u8]) -> Result<(Vec<usize>, Vec<f64>), String> {
    if bytes.len() < 10 {
        return Err(format!(
            "npy file too short: expected at least 10 header bytes, got {}.",
            bytes.len()
        ));
    }

    if &bytes[0..6] != MAGIC {
        return Err("npy file: bad magic; this is not a .npy file.".to_owned());
    }
    if bytes[6] != 0x01 {
        return Err(format!(
            "npy file: unsupported major version {} (only 1.0 is supported).",
            bytes[6]
        ));
    }

    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    let data_start = 10 + header_len;
    if bytes.len() < data_start {
        return Err(format!(
            "npy file too short: header declares {} header bytes but file is only {} bytes.",
            header_len,
            bytes.len()
        ));
    }

    let header = std::str::from_utf8(&bytes[10..data_start])
        .map_err(|_| "npy file: header is not valid ASCII.".to_owned())?;

    if !header.contains("'<f8'") {
        return Err(format!(
            "npy file: unsupported dtype in header {:?}; only little-endian f64 ('<f8') is supported.",
            header.trim_end()
        ));
    }
    if !header.contains("'fortran_order': False") {
        return Err("npy file: fortran_order must be False (C order).".to_owned());
    }

    let shape = parse_shape(header)?;
    let count = shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| format!("npy file: shape {:?} overflows the element count.", shape))?;

    let data_len = count
        .checked_mul(8)
        .and_then(|n| n.checked_add(data_start))
        .filter(|&required| bytes.len() >= required)
        .ok_or_else(|| {
            format!(
                "npy file too short: shape {:?} needs {} data values, but only {} bytes are present.",
                shape,
                count,
                bytes.len() - data_start
            )
        })?;

    let values = bytes[data_start..data_len]
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect();

    Ok((shape, values))
}

/// Extracts the shape tuple from the header dict, e.g. `(50, 3)` or `(50,)`.
fn parse_shape(header: &str) -> Result<Vec<usize>, String> {
    let key = "'shape':";
    let after_key = header
        .find(key)
        .map(|pos| &header[pos + key.len()..])
        .ok_or_else(|| "npy file: header has no 'shape' entry.".to_owned())?;

    let open = after_key
        .find('(')
        .ok_or_else(|| "npy file: shape entry has no opening parenthesis.".to_owned())?;
    let close = after_key
        .find(')')
        .ok_or_else(|| "npy file: shape entry has no closing parenthesis.".to_owned())?;

    let inner = &after_key[open + 1..close];
    let mut shape = Vec::new();
    for part in inner.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue; // trailing comma of a 1-tuple
        }
        let dim: usize = part
            .parse()
            .map_err(|_| format!("npy file: shape dimension {:?} is not an integer.", part))?;
        shape.push(dim);
    }
    if shape.is_empty() {
        return Err("npy file: zero-dimensional arrays are not supported.".to_owned());
    }
    Ok(shape)
}

/// Serializes `values` (C order, little-endian f64) with the given shape.
pub fn write_npy(shape: &[usize], values: &[f64]) -> Vec<u8> {
    let count: usize = shape.iter().product();
    assert_eq!(
        count,
        values.len(),
        "value count must match the product of the shape"
    );

    let shape_str = match shape.len() {
        1 => format!("({},)", shape[0]),
        _ => format!(
            "({})",
            shape
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    };
    let mut header = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': {}, }}",
        shape_str
    );

    // Pad so the data section starts on a 64-byte boundary; the final header
    // byte must be a newline.
    let unpadded = 10 + header.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    header.extend(std::iter::repeat(' ').take(padding));
    header.push('\n');

    let mut out = Vec::with_capacity(10 + header.len() + values.len() * 8);
    out.extend_from_slice(MAGIC);
    out.push(0x01);
    out.push(0x00);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}
