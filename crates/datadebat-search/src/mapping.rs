use serde_json::{json, Map, Value};

/// Settings and mappings for the debate index.
///
/// Free text uses the French analyzer with `keyword` sub-fields where exact
/// aggregation is needed. `sentiment`, `polarite` and `mots_cles_insecurite`
/// are reserved for downstream enrichment and never written by the loader.
#[must_use]
pub fn index_definition() -> Value {
    let keyword = || json!({ "type": "keyword" });
    let integer = || json!({ "type": "integer" });
    let day = || json!({ "type": "date", "format": "yyyy-MM-dd" });
    let french_text_with_keyword = || {
        json!({
            "type": "text",
            "analyzer": "french",
            "fields": { "keyword": { "type": "keyword" } }
        })
    };

    let fields = [
        ("date_seance", day()),
        ("date_parution", day()),
        ("annee", integer()),
        ("mois", integer()),
        ("legislature", integer()),
        ("session_nom", keyword()),
        ("session_parlementaire", keyword()),
        ("publication_numero", integer()),
        ("numero_premiere_page", integer()),
        ("section_id", keyword()),
        ("para_id", keyword()),
        (
            "texte",
            json!({
                "type": "text",
                "analyzer": "french",
                "fields": { "keyword": { "type": "keyword", "ignore_above": 256 } }
            }),
        ),
        ("orateur_nom", french_text_with_keyword()),
        ("orateur_fonction", keyword()),
        ("section_titre", french_text_with_keyword()),
        ("sous_section_titre", json!({ "type": "text", "analyzer": "french" })),
        ("vote_present", json!({ "type": "boolean" })),
        ("nombre_votants", integer()),
        ("nombre_suffrages_exprimes", integer()),
        ("votes_pour", integer()),
        ("votes_contre", integer()),
        ("mots_cles_insecurite", keyword()),
        ("sentiment", keyword()),
        ("polarite", json!({ "type": "float" })),
        ("extraction_timestamp", json!({ "type": "date" })),
    ];
    let properties: Map<String, Value> = fields
        .into_iter()
        .map(|(name, mapping)| (name.to_string(), mapping))
        .collect();

    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 0
        },
        "mappings": { "properties": properties }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_persisted_field_is_mapped() {
        let definition = index_definition();
        let properties = definition["mappings"]["properties"].as_object().unwrap();
        for field in [
            "publication_numero",
            "date_seance",
            "date_parution",
            "annee",
            "mois",
            "session_nom",
            "session_parlementaire",
            "legislature",
            "numero_premiere_page",
            "section_id",
            "section_titre",
            "sous_section_titre",
            "para_id",
            "orateur_nom",
            "orateur_fonction",
            "texte",
            "extraction_timestamp",
            "vote_present",
            "nombre_votants",
            "nombre_suffrages_exprimes",
            "votes_pour",
            "votes_contre",
        ] {
            assert!(properties.contains_key(field), "{field} is not mapped");
        }
    }

    #[test]
    fn text_fields_use_the_french_analyzer() {
        let definition = index_definition();
        let properties = &definition["mappings"]["properties"];
        assert_eq!(properties["texte"]["analyzer"], "french");
        assert_eq!(properties["orateur_nom"]["fields"]["keyword"]["type"], "keyword");
        assert_eq!(definition["settings"]["number_of_replicas"], 0);
    }
}
