// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parser for Hadoop job-configuration XML (`job.xml`/`conf.xml`): a flat
//! `<configuration><property><name/><value/></property>...</configuration>`
//! document.

use serde::Deserialize;
use std::collections::HashMap;
use std::io::BufRead;

#[derive(Debug, thiserror::Error)]
pub enum ConfParseError {
    #[error("malformed configuration xml: {0}")]
    Xml(#[from] quick_xml::DeError),
}

#[derive(Debug, Deserialize)]
struct Property {
    name: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "configuration")]
struct ParsedJobConf {
    #[serde(default, rename = "property")]
    properties: Vec<Property>,
}

/// Parse a job configuration XML document into a flat property map.
///
/// Later properties with the same name overwrite earlier ones, matching the
/// upstream Hadoop decoder's last-one-wins behavior.
pub fn parse_conf_xml<R: BufRead>(reader: R) -> Result<HashMap<String, String>, ConfParseError> {
    let parsed: ParsedJobConf = quick_xml::de::from_reader(reader)?;

    let mut props = HashMap::with_capacity(parsed.properties.len());
    for property in parsed.properties {
        props.insert(property.name, property.value);
    }
    Ok(props)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    fn sample_conf() -> &'static str {
        r#"<?xml version="1.0"?>
<configuration>
  <property>
    <name>mapreduce.input.fileinputformat.inputdir</name>
    <value>/input/dir</value>
  </property>
  <property>
    <name>mapreduce.output.fileoutputformat.outputdir</name>
    <value>/output/dir</value>
  </property>
  <property>
    <name>cascading.app.name</name>
    <value>appname</value>
  </property>
</configuration>
"#
    }

    #[test]
    fn parses_properties_into_a_flat_map() {
        let reader = BufReader::new(sample_conf().as_bytes());
        let props = parse_conf_xml(reader).expect("parse should succeed");

        assert_eq!(props.len(), 3);
        assert_eq!(
            props.get("mapreduce.input.fileinputformat.inputdir").map(String::as_str),
            Some("/input/dir")
        );
        assert_eq!(
            props.get("mapreduce.output.fileoutputformat.outputdir").map(String::as_str),
            Some("/output/dir")
        );
        assert_eq!(props.get("cascading.app.name").map(String::as_str), Some("appname"));
    }

    #[test]
    fn last_value_wins_for_duplicate_property_names() {
        let xml = r#"<configuration>
          <property><name>k</name><value>first</value></property>
          <property><name>k</name><value>second</value></property>
        </configuration>"#;
        let props = parse_conf_xml(BufReader::new(xml.as_bytes())).unwrap();
        assert_eq!(props.get("k").map(String::as_str), Some("second"));
    }

    #[test]
    fn rejects_malformed_xml() {
        let reader = BufReader::new("<configuration><property>".as_bytes());
        assert!(parse_conf_xml(reader).is_err());
    }
}
