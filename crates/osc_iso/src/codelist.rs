//! `codelists.xml`: a gmx `CT_CodelistCatalogue` of themes, variables and missions.

use osc_records::{EoMission, Theme, Variable};

use crate::xml::{
    sanitize_id, XmlWriter, NS_GCO, NS_GMD, NS_GML, NS_GMX, NS_XLINK, NS_XSI,
};

pub const CODELISTS_FILE: &str = "codelists.xml";

/// Catalogue header values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodelistInfo {
    pub name: String,
    pub scope: String,
    pub field_of_application: String,
    pub version: String,
    /// `YYYY-MM-DD`
    pub version_date: String,
}

impl Default for CodelistInfo {
    fn default() -> Self {
        CodelistInfo {
            name: "OSC_Codelists".to_string(),
            scope: "Codelists for Open Science Catalog".to_string(),
            field_of_application: "Open Science Catalog".to_string(),
            version: "1.0.0".to_string(),
            version_date: "2022-02-05".to_string(),
        }
    }
}

struct CodeEntry<'a> {
    identifier: String,
    description: &'a str,
    reference: Option<&'a str>,
}

fn write_code_list(w: &mut XmlWriter, entries: &[CodeEntry<'_>]) {
    w.open("gmx:codeListItem", &[]);
    for entry in entries {
        let gml_id = sanitize_id(&entry.identifier);
        w.open("gmx:codeEntry", &[]);
        w.open("gmx:CodeDefinition", &[("gml:id", &gml_id)]);
        w.leaf("gml:identifier", &[("codeSpace", "OSC")], &entry.identifier);
        w.leaf("gml:description", &[], entry.description);
        if let Some(href) = entry.reference {
            w.empty(
                "gml:descriptionReference",
                &[("xlink:type", "simple"), ("xlink:href", href)],
            );
        }
        w.close("gmx:CodeDefinition");
        w.close("gmx:codeEntry");
    }
    w.close("gmx:codeListItem");
}

/// Renders the catalogue; entries keep the order they are given in.
pub fn build_codelists(
    info: &CodelistInfo,
    themes: &[Theme],
    variables: &[Variable],
    missions: &[EoMission],
) -> String {
    let mut w = XmlWriter::new();
    w.open(
        "gmx:CT_CodelistCatalogue",
        &[
            ("xmlns:gmx", NS_GMX),
            ("xmlns:gco", NS_GCO),
            ("xmlns:gmd", NS_GMD),
            ("xmlns:gml", NS_GML),
            ("xmlns:xlink", NS_XLINK),
            ("xmlns:xsi", NS_XSI),
        ],
    );
    w.char_string("gmx:name", &info.name);
    w.char_string("gmx:scope", &info.scope);
    w.char_string("gmx:fieldOfApplication", &info.field_of_application);
    w.char_string("gmx:versionNumber", &info.version);
    w.open("gmx:versionDate", &[]);
    w.leaf("gco:Date", &[], &info.version_date);
    w.close("gmx:versionDate");
    w.open("gmx:language", &[]);
    w.leaf(
        "gmd:LanguageCode",
        &[("codeList", "#LanguageCode"), ("codeListValue", "eng")],
        "English",
    );
    w.close("gmx:language");
    w.code(
        "gmx:characterSet",
        "gmd:MD_CharacterSetCode",
        "#MD_CharacterSetCode",
        "utf8",
    );

    let themes: Vec<CodeEntry<'_>> = themes
        .iter()
        .map(|theme| CodeEntry {
            identifier: format!("OSC_Theme_{}", theme.name),
            description: &theme.description,
            reference: theme.link.as_deref(),
        })
        .collect();
    write_code_list(&mut w, &themes);

    let variables: Vec<CodeEntry<'_>> = variables
        .iter()
        .map(|variable| CodeEntry {
            identifier: format!("OSC_Variable_{}", variable.name),
            description: &variable.description,
            reference: variable.link.as_deref(),
        })
        .collect();
    write_code_list(&mut w, &variables);

    let missions: Vec<CodeEntry<'_>> = missions
        .iter()
        .map(|mission| CodeEntry {
            identifier: format!("OSC_EO_Mission_{}", mission.name),
            description: mission.description.as_deref().unwrap_or(&mission.name),
            reference: mission.link.as_deref(),
        })
        .collect();
    write_code_list(&mut w, &missions);

    w.close("gmx:CT_CodelistCatalogue");
    w.finish()
}
