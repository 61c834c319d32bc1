use std::fmt;

/// Announcement categories understood by the portal's search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportCategory {
    AnnualReport,
    InterimReport,
    QuarterlyReport,
    /// Annual, interim and quarterly reports together.
    AllReports,
    MajorEvents,
    /// No category filter.
    All,
}

impl ReportCategory {
    /// Value of the `category` form field.
    pub fn query_value(&self) -> &'static str {
        match self {
            Self::AnnualReport => "category_ndbg_szsh",
            Self::InterimReport => "category_bndbg_szsh",
            Self::QuarterlyReport => "category_sjdbg_szsh",
            Self::AllReports => "category_ndbg_szsh;category_bndbg_szsh;category_sjdbg_szsh",
            Self::MajorEvents => "category_zdsxgk_szsh",
            Self::All => "",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AnnualReport => "annual_report",
            Self::InterimReport => "interim_report",
            Self::QuarterlyReport => "quarterly_report",
            Self::AllReports => "all_reports",
            Self::MajorEvents => "major_events",
            Self::All => "all",
        }
    }

    /// The three periodic report categories.
    pub const PERIODIC: [ReportCategory; 3] = [
        Self::AnnualReport,
        Self::InterimReport,
        Self::QuarterlyReport,
    ];
}

impl fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_reports_joins_periodic_categories() {
        let joined: Vec<&str> = ReportCategory::PERIODIC
            .iter()
            .map(|c| c.query_value())
            .collect();
        assert_eq!(ReportCategory::AllReports.query_value(), joined.join(";"));
        assert_eq!(ReportCategory::All.query_value(), "");
    }
}
