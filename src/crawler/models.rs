use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use serde::Serialize;

pub const BUYER_LEAD_AGENCY: &str = "Educational Services Commission of New Jersey (ESCNJ)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuyerContact {
    pub phone: String,
    pub email: String,
    pub address: String,
}

/// Contact block for one awarded supplier, as printed in the vendor directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupplierContact {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub website: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplierEntry {
    pub suppliers: String,
    pub contact: SupplierContact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    ContractFiles,
    PricingFiles,
    OtherDocsFiles,
}

impl DocumentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentCategory::ContractFiles => "contract_files",
            DocumentCategory::PricingFiles => "pricing_files",
            DocumentCategory::OtherDocsFiles => "other_docs_files",
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A downloaded artifact attached to a contract record.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRef {
    pub document_name: String,
    pub human_name: String,
    pub category: DocumentCategory,
    pub size_bytes: usize,
    pub stored_path: Option<PathBuf>,
    #[serde(skip)]
    pub body: Bytes,
}

/// One entry of a file-browser style folder page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub entries: Vec<ListingEntry>,
}

impl Listing {
    /// Pairs titles with urls positionally; extra items on either side are dropped.
    pub fn from_parallel(titles: Vec<String>, urls: Vec<String>) -> Self {
        let entries = titles
            .into_iter()
            .zip(urls)
            .map(|(title, url)| ListingEntry { title, url })
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ListingEntry> {
        self.entries.iter()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractRecord {
    pub source_url: String,
    pub buyer_lead_agency: String,
    pub buyer_lead_agency_state: String,
    pub service_area_state: Vec<String>,
    pub service_area_national: bool,
    pub cooperative_language: bool,
    pub contract_type: String,
    pub buyer_contacts: Vec<BuyerContact>,
    pub cooperative_affiliation: String,
    pub title: String,
    pub contract_number: String,
    pub effective: String,
    pub expiration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppliers: Option<String>,
    pub supplier_contacts: Vec<SupplierContact>,
    #[serde(flatten)]
    pub documents: BTreeMap<DocumentCategory, Vec<DocumentRef>>,
}

impl ContractRecord {
    pub fn base(
        source_url: &str,
        title: String,
        contract_number: String,
        effective: String,
        expiration: String,
    ) -> Self {
        Self {
            source_url: source_url.to_string(),
            buyer_lead_agency: BUYER_LEAD_AGENCY.to_string(),
            buyer_lead_agency_state: "NJ".to_string(),
            service_area_state: vec!["NJ".to_string()],
            service_area_national: false,
            cooperative_language: true,
            contract_type: "COMPETITIVELY_BID_CONTRACT".to_string(),
            buyer_contacts: vec![BuyerContact {
                phone: "732-777-9848 ext. 3120".to_string(),
                email: "coop@escnj.us".to_string(),
                address: "1660 Stelton Road, Second Floor, Piscataway, New Jersey 08854"
                    .to_string(),
            }],
            cooperative_affiliation: BUYER_LEAD_AGENCY.to_string(),
            title,
            contract_number,
            effective,
            expiration,
            suppliers: None,
            supplier_contacts: Vec::new(),
            documents: BTreeMap::new(),
        }
    }

    /// Copy of this record carrying one supplier's name and contact.
    pub fn for_supplier(&self, entry: &SupplierEntry) -> Self {
        let mut record = self.clone();
        record.suppliers = Some(entry.suppliers.clone());
        record.supplier_contacts = vec![entry.contact.clone()];
        record
    }

    pub fn supplier_name(&self) -> &str {
        self.suppliers.as_deref().unwrap_or_default()
    }

    pub fn attach(&mut self, document: DocumentRef) {
        self.documents
            .entry(document.category)
            .or_default()
            .push(document);
    }

    pub fn documents_in(&self, category: DocumentCategory) -> &[DocumentRef] {
        self.documents
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
