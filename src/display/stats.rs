/// Presentation counters
#[derive(Debug, Clone, Default)]
pub struct DisplayStats {
    pub frames_presented: u64,
    pub present_errors: u64,
}

impl DisplayStats {
    pub fn record_present(&mut self) {
        self.frames_presented += 1;
    }

    pub fn record_error(&mut self) {
        self.present_errors += 1;
    }
}
