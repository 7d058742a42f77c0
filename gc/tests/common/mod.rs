//! Shared fixtures for integration tests

#![allow(dead_code)]

use grammaticon::{RawDataset, RawTable};
use std::path::Path;

pub const CONCEPTS: &str = "\
id,label,definition,quotation,comments,GOLD counterpart,GOLD URL,GOLD comment,ISOCAT counterpart,ISOCAT URL,ISOCAT comments
1,clause,A syntactic unit,,,,,,,,
2,main clause,,,,,,,,,
9,subordinate clause,,,,,,,,,
10,relative clause,,,,,,,,,
";

pub const METAFEATURES: &str = "\
id,name,feature_area
1,Tense,verbs
2,Case,
";

pub const FEATURE_LISTS: &str = "\
id,name,URL,authors,number of features,year
10,WALS,https://wals.info,Dryer & Haspelmath,192,2013
";

pub const FEATURES: &str = "\
feature_ID,feature name,feature description,meta_feature_id,collection_id,collection URL,collection numbers
f1,Past tense,,1,10,,
f2,Ghost feature,,99,10,,
f3,Case marking,,2,10,,
";

pub const CONCEPTS_METAFEATURES: &str = "\
concept_id,meta_feature__id
1,1
2,
9,2
";

pub const HIERARCHY: &str = "\
concept_id,concept_child_id,concept_parent_id
2,,1
1,2,
10,,1
1,10,
9,,1
1,9,
";

pub fn raw_files() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Concepts.csv", CONCEPTS),
        ("Metafeatures.csv", METAFEATURES),
        ("Feature_lists.csv", FEATURE_LISTS),
        ("Features.csv", FEATURES),
        ("Concepts_metafeatures.csv", CONCEPTS_METAFEATURES),
        ("Concepthierarchy.csv", HIERARCHY),
    ]
}

/// The fixture export with one file's content replaced
pub fn dataset_with(name: &str, content: &str) -> RawDataset {
    raw_files()
        .into_iter()
        .map(|(file, default)| {
            let body = if file == name { content } else { default };
            RawTable::parse(file, body).expect("fixture should parse")
        })
        .fold(RawDataset::new(), RawDataset::with)
}

pub fn dataset() -> RawDataset {
    dataset_with("", "")
}

/// Write the fixture export into `dir`
pub fn write_raw_dir(dir: &Path) {
    for (file, content) in raw_files() {
        std::fs::write(dir.join(file), content).expect("Failed to write fixture");
    }
}
