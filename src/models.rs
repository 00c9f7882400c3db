use serde::{Deserialize, Serialize};

use crate::document::{RankedResult, SummaryResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeInfo {
    pub challenge_id: String,
    pub test_case_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentRef {
    pub filename: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Persona {
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobToBeDone {
    pub task: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InputJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_info: Option<ChallengeInfo>,
    pub documents: Vec<DocumentRef>,
    pub persona: Persona,
    pub job_to_be_done: JobToBeDone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSection {
    pub document: String,
    pub section_title: String,
    pub importance_rank: u32,
    pub page_number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsectionAnalysis {
    pub document: String,
    pub refined_text: String,
    pub page_number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub input_documents: Vec<String>,
    pub persona: String,
    pub job_to_be_done: String,
    pub processing_timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputJson {
    pub metadata: Metadata,
    pub extracted_sections: Vec<ExtractedSection>,
    pub subsection_analysis: Vec<SubsectionAnalysis>,
}

impl From<&RankedResult> for ExtractedSection {
    fn from(r: &RankedResult) -> Self {
        Self {
            document: r.document_id.clone(),
            section_title: r.section_title.clone(),
            importance_rank: r.importance_rank,
            page_number: r.page_number,
        }
    }
}

impl From<SummaryResult> for SubsectionAnalysis {
    fn from(s: SummaryResult) -> Self {
        Self {
            document: s.document_id,
            refined_text: s.refined_text,
            page_number: s.page_number,
        }
    }
}
