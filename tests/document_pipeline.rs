use ept_tools::csv_format::CsvEptFile;
use ept_tools::definitions::{DefinitionTable, DEFAULT_SHEET};
use ept_tools::engine::CodificationRuleEngine;
use ept_tools::schema::EptSchema;
use ept_tools::template::EPT_HEADERS;
use ept_tools::validate::SchemaValidator;
use ept_tools::yaml_format::YamlEptFile;
use ept_tools::Format;
use pretty_assertions::assert_eq;
use std::fs::{self, File};
use tempfile::tempdir;

const DEFINITION_SHEET: &str = r#"European PRIIPs Template V2.1,,,,,,,
,,,,,,,
,,,,,,,
,,,,,,,
,,,,,,,
,,,,,,,
NUM,Data,Definition,Codification,Comment,PRIIPs sync,M/O/C,UK
1,General information,,,,,,
2,00001_EPT_Version,Version of the template,V21 or V21UK,,Y,M,Y
3,00002_EPT_Producer_Name,Name of the EPT producer,string[255],,Y,,Y
4,00004_EPT_Producer_Email,Contact email,Alphanum (max 255),,Y,,Y
5,00005_File_Generation_Date_And_Time,Generation time,YYYY-MM-DD  hh:mm:ss       ISO 8601     (UTC+0),,Y,M,Y
6,00030_Portfolio_Identifying_Data,Identifier of the fund,"ISIN, CUSIP or other",,Y,M,Y
7,00040_Type_Of_Identification_Code_For_The_Fund_Share_Or_Portfolio,Type of identifier,integer,,Y,M,Y
8,00060_Portfolio_Or_Share_Class_Currency,Currency,Code ISO 4217,,Y,M,Y
9,00120_Reference_Language,Language of narratives,ISO 639-2,,Y,,Y
10,01090_SRI,Summary risk indicator,number[1-7],,Y,M,Y
11,04040_Investment_Objective_Portfolio,Objective,free text,Narrative,Y,,Y
12,06010_Bonds_Weight,Weight of bonds,floating decimal,,N,M,N
"#;

fn build_schema() -> EptSchema {
    let table = DefinitionTable::from_csv(&mut DEFINITION_SHEET.as_bytes(), DEFAULT_SHEET).unwrap();
    let derived = CodificationRuleEngine::default()
        .derive(table.sheet(DEFAULT_SHEET).unwrap())
        .unwrap();

    assert_eq!(derived.properties.len(), 11);
    assert_eq!(derived.unresolved.len(), 1);
    assert_eq!(derived.unresolved[0].field, "04040_Investment_Objective_Portfolio");

    EptSchema::build(derived)
}

#[test]
fn generated_schema_survives_a_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schemas").join("ept.schema.json");

    let schema = build_schema();
    schema.save(&path).unwrap();
    let loaded = EptSchema::load(&path).unwrap();

    assert_eq!(loaded, schema);
    assert_eq!(
        loaded.ept().required,
        vec![
            "00001_EPT_Version",
            "00005_File_Generation_Date_And_Time",
            "00030_Portfolio_Identifying_Data",
            "00040_Type_Of_Identification_Code_For_The_Fund_Share_Or_Portfolio",
            "00060_Portfolio_Or_Share_Class_Currency",
            "00120_Reference_Language",
            "01020_Portfolio_VEV_Reference",
            "01090_SRI",
            "02190_Past_Performance_Link",
            "02200_Previous_Performance_Scenarios_Calculation_Link",
            "02210_Past_Performance_Number_Of_Years",
        ]
    );
}

#[test]
fn yaml_document_validates_against_generated_schema() {
    let schema = build_schema();
    let validator = SchemaValidator::new(&schema).unwrap();

    let yaml = r#"
- 00001_EPT_Version: V21
  00002_EPT_Producer_Name: Captor Fund Management AB
  00004_EPT_Producer_Email: info@captor.se
  00005_File_Generation_Date_And_Time: "2024-01-31T10:00:00Z"
  00030_Portfolio_Identifying_Data: SE0011337195
  00040_Type_Of_Identification_Code_For_The_Fund_Share_Or_Portfolio: 1
  00060_Portfolio_Or_Share_Class_Currency: SEK
  00120_Reference_Language: swe
  01020_Portfolio_VEV_Reference: 0.02
  01090_SRI: 2
  02190_Past_Performance_Link: https://captor.se
  02200_Previous_Performance_Scenarios_Calculation_Link: https://captor.se
  02210_Past_Performance_Number_Of_Years: 5
"#;
    let document = YamlEptFile::document(&mut yaml.as_bytes()).unwrap();
    let issues = validator.validate(&document);

    // The fixture table defines no VEV or past-performance fields, so those
    // required keys are rejected as additional properties.
    let record_issues: Vec<_> = issues
        .iter()
        .filter(|issue| issue.instance_path.starts_with("/0"))
        .collect();
    assert_eq!(record_issues.len(), 4);
    assert!(record_issues
        .iter()
        .all(|issue| issue.keyword == "additionalProperties"));
    assert_eq!(issues.last().unwrap().keyword, "oneOf");
}

#[test]
fn yaml_record_with_wrong_identifier_type_is_rejected() {
    let schema = build_schema();
    let validator = SchemaValidator::new(&schema).unwrap();

    let yaml = "00001_EPT_Version: V21\n00040_Type_Of_Identification_Code_For_The_Fund_Share_Or_Portfolio: 10\n";
    let document = YamlEptFile::document(&mut yaml.as_bytes()).unwrap();
    let issues = validator.validate_record(&document);

    let identifier_issue = issues
        .iter()
        .find(|issue| issue.instance_path == "/00040_Type_Of_Identification_Code_For_The_Fund_Share_Or_Portfolio")
        .unwrap();
    assert_eq!(identifier_issue.keyword, "enum");
}

#[test]
fn yaml_converts_to_template_csv_and_back() {
    let dir = tempdir().unwrap();
    let yaml_path = dir.path().join("fund.yaml");
    fs::write(
        &yaml_path,
        "- 00001_EPT_Version: V21\n  00050_Portfolio_Name: Captor Iris Bond\n  01090_SRI: 2\n  06070_Uses_PI: ''\n",
    )
    .unwrap();

    let csv_path = Format::Csv.output_path(&yaml_path, dir.path());
    assert_eq!(csv_path, dir.path().join("fund.csv"));

    let yaml = YamlEptFile::from_read(&mut File::open(&yaml_path).unwrap()).unwrap();
    let csv: CsvEptFile = yaml.into();
    csv.write_to(&mut File::create(&csv_path).unwrap()).unwrap();

    let written = fs::read_to_string(&csv_path).unwrap();
    let header = written.lines().next().unwrap();
    assert_eq!(header.split(',').count(), EPT_HEADERS.len());

    let reread = CsvEptFile::from_read(&mut File::open(&csv_path).unwrap()).unwrap();
    let back: YamlEptFile = reread.into();
    assert_eq!(back.records.len(), 1);
    let keys: Vec<&str> = back.records[0].keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["00001_EPT_Version", "00050_Portfolio_Name", "01090_SRI"]);
}
