use std::io::Write;
use std::sync::Arc;

use tempfile::{NamedTempFile, TempDir};

use burrow::{
    Backend, CsvSource, DocId, Engine, EngineConfig, FileBackend, Index, IndexConfig, KeyFormat,
    SearchRequest, Source, Token,
};

const CONFIG: &str = r#"{
    "indexes": [
        {
            "name": "books",
            "key_format": "string",
            "categories": [
                { "name": "title", "qualifiers": ["t"] },
                {
                    "name": "author",
                    "similarity": { "type": "phonetic", "encoder": "double_metaphone" },
                    "weights": { "type": "constant", "weight": 1.25 }
                }
            ]
        }
    ],
    "search": { "max_allocations": 10 }
}"#;

fn csv_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "id,title,author").unwrap();
    writeln!(file, "b-1,The Hobbit,Tolkien").unwrap();
    writeln!(file, "b-2,The Silmarillion,Tolkien").unwrap();
    writeln!(file, "b-3,Dune,Herbert").unwrap();
    writeln!(file, "b-4,Hobbit Cookbook,Smyth").unwrap();
    file
}

fn engine(root: &TempDir, csv: &NamedTempFile) -> burrow::Result<Engine> {
    let config = EngineConfig::from_json_str(CONFIG)?;
    let source: Arc<dyn Source> =
        Arc::new(CsvSource::new(csv.path()).key_format(KeyFormat::String));
    Engine::from_config(
        config,
        Arc::new(FileBackend::new(root.path())),
        [("books".to_string(), source)],
    )
}

#[test]
fn test_csv_index_and_search() -> burrow::Result<()> {
    let root = TempDir::new().unwrap();
    let csv = csv_file();
    let engine = engine(&root, &csv)?;

    let reports = engine.index_all()?;
    assert!(reports[0].is_success());
    assert_eq!(reports[0].stats("title").unwrap().records, 4);
    engine.check_all()?;

    let results = engine.search(&SearchRequest::new("t:hobbit tolkien"))?;
    assert_eq!(results.hits.len(), 1);
    assert_eq!(results.hits[0].id, DocId::Str("b-1".into()));

    let results = engine.search(&SearchRequest::new("smith~ hobb*"))?;
    assert_eq!(results.hits[0].id, DocId::Str("b-4".into()));
    Ok(())
}

#[test]
fn test_restored_bundles_match_fresh_ones() -> burrow::Result<()> {
    let root = TempDir::new().unwrap();
    let csv = csv_file();

    let fresh = engine(&root, &csv)?;
    fresh.index_all()?;

    let restored = engine(&root, &csv)?;
    assert!(restored.search(&SearchRequest::new("hobbit")).is_err());
    restored.load_all()?;

    let tokens = ["hobbit", "hob*", "bit*", "tolkien", "smith~", "dune"];
    for category in ["title", "author"] {
        let a = fresh.index("books").unwrap().category(category).unwrap();
        let b = restored.index("books").unwrap().category(category).unwrap();
        for text in tokens {
            let token = Token::processed(text, restored.qualifiers());
            assert_eq!(a.ids_for(&token)?, b.ids_for(&token)?);
            assert_eq!(
                a.weight_for(&token)?.to_bits(),
                b.weight_for(&token)?.to_bits()
            );
            assert_eq!(a.similar_tokens(&token)?, b.similar_tokens(&token)?);
        }
    }

    for query in ["hobbit", "t:hobbit tolkien", "smith~", "the"] {
        let request = SearchRequest::new(query);
        assert_eq!(
            fresh.search(&request)?.hits,
            restored.search(&request)?.hits
        );
    }
    Ok(())
}

#[test]
fn test_bundle_files_on_disk() -> burrow::Result<()> {
    let root = TempDir::new().unwrap();
    let csv = csv_file();
    let engine = engine(&root, &csv)?;
    engine.index_all()?;

    let exact = root.path().join("books").join("title").join("exact");
    for part in ["inverted", "weights", "similarity", "configuration"] {
        assert!(exact.join(format!("{part}.json")).exists());
    }

    let backend = FileBackend::new(root.path());
    let key = burrow::BundleKey::new("books", "title", burrow::Phase::Exact);
    let bundle = backend.load(&key)?;
    assert_eq!(bundle.setting("key_format"), Some("string"));
    assert_eq!(
        bundle.ids("hobbit"),
        &[DocId::Str("b-1".into()), DocId::Str("b-4".into())]
    );

    engine.clear_all()?;
    assert!(!backend.exists(&key));
    assert!(engine.check_all().is_err());
    Ok(())
}

#[test]
fn test_index_without_source_fails() {
    let config = EngineConfig::from_json_str(CONFIG).unwrap();
    let result = Engine::from_config(
        config,
        Arc::new(FileBackend::new(std::env::temp_dir())),
        Vec::new(),
    );
    assert!(matches!(result, Err(burrow::BurrowError::InvalidConfig(_))));

    let config = IndexConfig::from_json_str(r#"{ "name": "books", "categories": [] }"#).unwrap();
    assert!(Index::builder(config).build().is_ok());
}
