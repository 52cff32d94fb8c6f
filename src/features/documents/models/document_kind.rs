use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kinds of document the system can generate, addressed by their URL slug
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    /// บันทึกข้อความขออนุมัติ
    Approval,
    /// สัญญาจ้าง
    Contract,
    /// ขอบเขตของงาน (Terms of Reference)
    Tor,
    /// แบบเสนอโครงการ
    FormProject,
    /// รายงานสรุปผลโครงการ
    Summary,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 5] = [
        DocumentKind::Approval,
        DocumentKind::Contract,
        DocumentKind::Tor,
        DocumentKind::FormProject,
        DocumentKind::Summary,
    ];

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.slug() == slug)
    }

    pub fn slug(&self) -> &'static str {
        match self {
            DocumentKind::Approval => "approval",
            DocumentKind::Contract => "contract",
            DocumentKind::Tor => "tor",
            DocumentKind::FormProject => "form-project",
            DocumentKind::Summary => "summary",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            DocumentKind::Approval => "บันทึกข้อความขออนุมัติ",
            DocumentKind::Contract => "สัญญาจ้าง",
            DocumentKind::Tor => "ขอบเขตของงาน (TOR)",
            DocumentKind::FormProject => "แบบเสนอโครงการ",
            DocumentKind::Summary => "รายงานสรุปผลโครงการ",
        }
    }

    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            DocumentKind::Approval => &[
                "project_name",
                "department",
                "subject",
                "to",
                "date",
                "amount",
            ],
            DocumentKind::Contract => &[
                "contract_number",
                "project_name",
                "employer_name",
                "contractor_name",
                "amount",
                "start_date",
                "end_date",
            ],
            DocumentKind::Tor => &[
                "project_name",
                "background",
                "objectives",
                "scope",
                "duration",
                "budget",
            ],
            DocumentKind::FormProject => &[
                "project_name",
                "organization",
                "responsible_person",
                "rationale",
                "objectives",
                "budget",
                "duration",
            ],
            DocumentKind::Summary => &[
                "project_name",
                "period",
                "results",
                "budget_used",
                "summary",
            ],
        }
    }

    /// Template file name inside the template directory
    pub fn template_file(&self) -> String {
        format!("{}.docx", self.slug())
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_round_trip() {
        for kind in DocumentKind::ALL {
            assert_eq!(DocumentKind::from_slug(kind.slug()), Some(kind));
        }
        assert_eq!(DocumentKind::from_slug("invoice"), None);
        assert_eq!(DocumentKind::from_slug("Approval"), None);
    }

    #[test]
    fn test_serde_matches_slug() {
        assert_eq!(
            serde_json::to_string(&DocumentKind::FormProject).unwrap(),
            "\"form-project\""
        );
    }

    #[test]
    fn test_every_kind_requires_project_name() {
        for kind in DocumentKind::ALL {
            assert!(kind.required_fields().contains(&"project_name"));
        }
        assert_eq!(DocumentKind::Contract.template_file(), "contract.docx");
    }
}
