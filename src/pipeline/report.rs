//! Report of what happened while rasterizing one image.
//!
//! Clipping is never silent: every object that reached outside the image is
//! listed here, alongside notes about the pith marker.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::annotation::PithPoint;

/// Summary of one rasterization.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RasterReport {
    pub height: usize,
    pub width: usize,
    /// Number of annotation objects processed.
    pub objects: usize,
    /// Objects per geometry kind.
    pub objects_by_kind: BTreeMap<String, usize>,
    /// Pixel count per class name in the final mask, background included.
    pub class_pixels: BTreeMap<String, usize>,
    /// Pith marker, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pith: Option<PithPoint>,
    pub issues: Vec<RasterIssue>,
}

impl RasterReport {
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            ..Default::default()
        }
    }

    pub fn add(&mut self, issue: RasterIssue) {
        self.issues.push(issue);
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == RasterSeverity::Warning)
            .count()
    }

    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == RasterSeverity::Info)
            .count()
    }

    /// Issues with the given code.
    pub fn issues_with(&self, code: RasterIssueCode) -> impl Iterator<Item = &RasterIssue> {
        self.issues.iter().filter(move |i| i.code == code)
    }
}

impl fmt::Display for RasterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Rasterized {} object(s) into a {}x{} mask",
            self.objects, self.width, self.height
        )?;

        match self.pith {
            Some(p) => writeln!(f, "  pith: ({}, {})", p.x, p.y)?,
            None => writeln!(f, "  pith: none")?,
        }

        if !self.class_pixels.is_empty() {
            writeln!(f, "  pixels per class:")?;
            for (name, count) in &self.class_pixels {
                writeln!(f, "    {:<18} {}", name, count)?;
            }
        }

        if !self.issues.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "{} warning(s), {} note(s):",
                self.warning_count(),
                self.info_count()
            )?;
            for issue in &self.issues {
                writeln!(f, "  {}", issue)?;
            }
        }

        Ok(())
    }
}

/// One note or warning produced during rasterization.
#[derive(Clone, Debug, Serialize)]
pub struct RasterIssue {
    pub severity: RasterSeverity,
    pub code: RasterIssueCode,
    /// Index of the object the issue is about, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<usize>,
    pub message: String,
}

impl RasterIssue {
    pub fn warning(code: RasterIssueCode, object: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: RasterSeverity::Warning,
            code,
            object,
            message: message.into(),
        }
    }

    pub fn info(code: RasterIssueCode, object: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: RasterSeverity::Info,
            code,
            object,
            message: message.into(),
        }
    }
}

impl fmt::Display for RasterIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            RasterSeverity::Warning => "WARN",
            RasterSeverity::Info => "INFO",
        };
        match self.object {
            Some(index) => write!(
                f,
                "[{}] {:?} in object {}: {}",
                severity, self.code, index, self.message
            ),
            None => write!(f, "[{}] {:?}: {}", severity, self.code, self.message),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RasterSeverity {
    Info,
    Warning,
}

/// Stable codes for rasterization issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RasterIssueCode {
    /// Geometry partly outside the image; the outside part was dropped.
    GeometryClipped,
    /// Geometry entirely outside the image; it contributed no pixels.
    GeometryOutsideImage,
    /// No point object, so no pith location.
    MissingPith,
    /// More than one pith candidate; only the first was kept.
    ExtraPithCandidates,
}
