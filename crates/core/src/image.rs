// HartLab - RISC-V Conformance Simulator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Loaded program representation handed from the loader to the machine.

use serde::{Deserialize, Serialize};

/// A contiguous run of bytes to place at a guest address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start_addr: u32,
    pub data: Vec<u8>,
}

/// An executable image: loadable segments plus the address to start at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramImage {
    pub entry_point: u32,
    pub segments: Vec<Segment>,
}

impl ProgramImage {
    pub fn new(entry_point: u32) -> Self {
        Self {
            entry_point,
            segments: Vec::new(),
        }
    }

    pub fn add_segment(&mut self, start_addr: u32, data: Vec<u8>) {
        self.segments.push(Segment { start_addr, data });
    }

    /// Total number of loadable bytes across all segments.
    pub fn loaded_bytes(&self) -> usize {
        self.segments.iter().map(|s| s.data.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_accounting() {
        let mut image = ProgramImage::new(0x8000_0000);
        assert_eq!(image.loaded_bytes(), 0);
        image.add_segment(0x8000_0000, vec![0; 16]);
        image.add_segment(0x8000_1000, vec![0; 8]);
        assert_eq!(image.segments.len(), 2);
        assert_eq!(image.loaded_bytes(), 24);
        assert_eq!(image.entry_point, 0x8000_0000);
    }
}
