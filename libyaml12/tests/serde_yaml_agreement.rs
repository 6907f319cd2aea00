//! Differential tests against `serde_yaml` on inputs both loaders read the
//! same way: the collection and structure examples of the YAML 1.2
//! specification.

use num_traits::ToPrimitive;
use serde::Deserialize;

use libyaml12::{load_all, Value};

const EXAMPLES: &[(&str, &str)] = &[
    ("2.1", "- Mark McGwire\n- Sammy Sosa\n- Ken Griffey\n"),
    (
        "2.2",
        "hr:  65    # Home runs\navg: 0.278 # Batting average\nrbi: 147   # Runs Batted In\n",
    ),
    (
        "2.3",
        "american:\n  - Boston Red Sox\n  - Detroit Tigers\n  - New York Yankees\nnational:\n  - New York Mets\n  - Chicago Cubs\n  - Atlanta Braves\n",
    ),
    (
        "2.4",
        "-\n  name: Mark McGwire\n  hr:   65\n  avg:  0.278\n-\n  name: Sammy Sosa\n  hr:   63\n  avg:  0.288\n",
    ),
    (
        "2.5",
        "- [name        , hr, avg  ]\n- [Mark McGwire, 65, 0.278]\n- [Sammy Sosa  , 63, 0.288]\n",
    ),
    (
        "2.6",
        "Mark McGwire: {hr: 65, avg: 0.278}\nSammy Sosa: {\n    hr: 63,\n    avg: 0.288\n  }\n",
    ),
    (
        "2.7",
        "# Ranking of 1998 home runs\n---\n- Mark McGwire\n- Sammy Sosa\n- Ken Griffey\n\n# Team ranking\n---\n- Chicago Cubs\n- St Louis Cardinals\n",
    ),
    (
        "2.8",
        "---\ntime: 20:03:20\nplayer: Sammy Sosa\naction: strike (miss)\n...\n---\ntime: 20:03:47\nplayer: Sammy Sosa\naction: grand slam\n...\n",
    ),
];

/// The `serde_yaml` value for one of ours, for the types both share.
fn to_serde(value: &Value) -> serde_yaml::Value {
    match value {
        Value::Null => serde_yaml::Value::Null,
        Value::Bool(b) => serde_yaml::Value::Bool(*b),
        Value::Integer(n) => serde_yaml::Value::Number(n.to_i64().unwrap().into()),
        Value::Float(f) => serde_yaml::Value::Number((*f).into()),
        Value::String(s) => serde_yaml::Value::String(s.clone()),
        Value::Sequence(seq) => serde_yaml::Value::Sequence(seq.iter().map(to_serde).collect()),
        Value::Mapping(map) => serde_yaml::Value::Mapping(
            map.iter().map(|(k, v)| (to_serde(k), to_serde(v))).collect(),
        ),
        other => panic!("no serde_yaml counterpart for {:?}", other),
    }
}

fn serde_documents(yaml: &str) -> Vec<serde_yaml::Value> {
    serde_yaml::Deserializer::from_str(yaml)
        .map(|doc| serde_yaml::Value::deserialize(doc).unwrap())
        .collect()
}

#[test]
fn test_agrees_with_serde_yaml() {
    for (name, yaml) in EXAMPLES {
        let ours: Vec<serde_yaml::Value> = load_all(yaml)
            .map(|doc| to_serde(&doc.unwrap()))
            .collect();
        let theirs = serde_documents(yaml);
        assert_eq!(ours, theirs, "example {}", name);
    }
}

#[test]
fn test_document_counts_agree() {
    for (name, yaml) in EXAMPLES {
        assert_eq!(
            load_all(yaml).count(),
            serde_documents(yaml).len(),
            "example {}",
            name
        );
    }
}
