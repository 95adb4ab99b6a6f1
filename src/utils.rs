/// Converts a 1-based line and column, as reported by `serde_json`, into a byte
/// offset into `source`. Columns count bytes; a column of 0 points at the start of
/// the line. The result never exceeds `source.len()`.
pub fn get_offset(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (index, text) in source.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            let column = column.saturating_sub(1).min(text.len());
            return floor_char_boundary(source, offset + column);
        }
        offset += text.len();
    }
    source.len()
}

fn floor_char_boundary(source: &str, mut offset: usize) -> usize {
    while offset > 0 && !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
