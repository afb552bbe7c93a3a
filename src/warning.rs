#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningCode {
    NoHeaderDetected,
    MalformedHeader,
    DecodingFallback,
    EmptyPage,
    NoCoursesFound,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseWarning {
    pub code: WarningCode,
    pub message: String,
    pub page: Option<u32>,
}

impl ParseWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            page: None,
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}
