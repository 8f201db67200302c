//! UI components for the message viewer

pub mod header;
pub mod footer;
pub mod message_list;
pub mod overlays;

pub use header::*;
pub use footer::*;
pub use message_list::*;
pub use overlays::*;

#[cfg(test)]
pub(crate) mod testing {
    use ratatui::buffer::Buffer;

    /// Buffer rows as plain strings
    pub fn rows(buffer: &Buffer) -> Vec<String> {
        let area = buffer.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buffer.cell((x, y)).map_or(" ", |c| c.symbol()))
                    .collect()
            })
            .collect()
    }
}
