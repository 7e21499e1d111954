/// A single video sample delivered by the camera: contiguous pixel bytes in
/// row-major order.
///
/// The detection layer treats the buffer as opaque. A frame is moved into
/// the detector and dropped as soon as its detection completes.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Builds a mid-grey RGB frame of the given size.
    pub fn blank(width: u32, height: u32, index: usize) -> Self {
        let len = (width as usize) * (height as usize) * 3;
        Self::new(vec![128; len], width, height, 3, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Sequence number assigned by the camera at delivery time.
    pub fn index(&self) -> usize {
        self.index
    }

    /// True when the buffer is non-empty and its length matches
    /// `width * height * channels`.
    pub fn is_well_formed(&self) -> bool {
        let expected = (self.width as usize) * (self.height as usize) * (self.channels as usize);
        expected > 0 && self.data.len() == expected
    }
}
