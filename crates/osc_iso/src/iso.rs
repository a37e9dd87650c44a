//! ISO 19139 metadata for project and product nodes.
//!
//! Projects are rendered as `gmd:MD_Metadata` records of hierarchy level
//! `datasetcollection`. Products are ISO 19139-2 `gmi:MI_Metadata` records
//! of level `dataset` that list their missions as acquisition platforms.

use chrono::{DateTime, SecondsFormat, Utc};

use osc_catalog::link::MEDIA_XML;
use osc_catalog::{FormatContext, MetadataFormatter, Node, NodeKind, Rel};
use osc_records::Status;

use crate::xml::{
    sanitize_id, XmlWriter, NS_GCO, NS_GMD, NS_GMI, NS_GML, NS_XLINK, NS_XSI,
};

pub const ISO_FILE: &str = "iso.xml";
pub const ISO_ASSET: &str = "iso-metadata";

const LANGUAGE: &str = "eng";
const CHARSET: &str = "utf8";
const CODE_LIST_BASE: &str =
    "http://standards.iso.org/iso/19139/resources/gmxCodelists.xml";

fn code_list(name: &str) -> String {
    format!("{}#{}", CODE_LIST_BASE, name)
}

pub fn progress_code(status: Status) -> &'static str {
    match status {
        Status::Completed => "completed",
        Status::Ongoing => "onGoing",
        Status::Planned => "planned",
    }
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// One `gmd:onLine` distribution entry.
struct OnlineResource<'a> {
    url: &'a str,
    name: &'static str,
    function: &'static str,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Iso19139Formatter;

impl Iso19139Formatter {
    pub fn new() -> Self {
        Iso19139Formatter
    }
}

impl MetadataFormatter for Iso19139Formatter {
    fn file_name(&self) -> &'static str {
        ISO_FILE
    }

    fn media_type(&self) -> &'static str {
        MEDIA_XML
    }

    fn applies_to(&self, node: &Node) -> bool {
        matches!(node.osc_type, Some(NodeKind::Project | NodeKind::Product))
    }

    fn format(&self, node: &Node, ctx: &FormatContext<'_>) -> Result<String, String> {
        let is_product = match node.osc_type {
            Some(NodeKind::Project) => false,
            Some(NodeKind::Product) => true,
            other => {
                return Err(format!(
                    "{}: no ISO rendering for node type {}",
                    node.id,
                    other.map(|kind| kind.as_str()).unwrap_or("(none)")
                ))
            }
        };
        let status = node
            .osc_status
            .ok_or_else(|| format!("{}: missing osc:status", node.id))?;

        let root = if is_product {
            "gmi:MI_Metadata"
        } else {
            "gmd:MD_Metadata"
        };
        let mut w = XmlWriter::new();
        let mut namespaces = vec![
            ("xmlns:gmd", NS_GMD),
            ("xmlns:gco", NS_GCO),
            ("xmlns:gml", NS_GML),
            ("xmlns:xlink", NS_XLINK),
            ("xmlns:xsi", NS_XSI),
        ];
        if is_product {
            namespaces.push(("xmlns:gmi", NS_GMI));
        }
        w.open(root, &namespaces);

        w.char_string("gmd:fileIdentifier", &node.id);
        w.code(
            "gmd:language",
            "gmd:LanguageCode",
            "http://www.loc.gov/standards/iso639-2/",
            LANGUAGE,
        );
        w.code(
            "gmd:characterSet",
            "gmd:MD_CharacterSetCode",
            &code_list("MD_CharacterSetCode"),
            CHARSET,
        );
        if is_product {
            if let Some(parent) = ctx.parent_identifier {
                w.char_string("gmd:parentIdentifier", parent);
            }
        }
        w.code(
            "gmd:hierarchyLevel",
            "gmd:MD_ScopeCode",
            &code_list("MD_ScopeCode"),
            if is_product { "dataset" } else { "datasetcollection" },
        );

        let documentation = if is_product {
            node.titled_link(Rel::Via, "Documentation")
        } else {
            node.titled_link(Rel::Via, "EO4Society Link")
        }
        .map(|link| link.href.as_str());

        w.open("gmd:contact", &[]);
        write_point_of_contact(&mut w, node, None);
        w.close("gmd:contact");
        w.open("gmd:dateStamp", &[]);
        w.leaf("gco:DateTime", &[], &timestamp(&ctx.datestamp));
        w.close("gmd:dateStamp");
        w.char_string(
            "gmd:metadataStandardName",
            if is_product {
                "ISO 19115-2 Geographic Information - Metadata Part 2 Extensions for imagery and gridded data"
            } else {
                "ISO 19115:2003 - Geographic information - Metadata"
            },
        );
        w.char_string(
            "gmd:metadataStandardVersion",
            if is_product { "ISO 19115-2:2009(E)" } else { "ISO 19115:2003" },
        );

        write_identification(&mut w, node, status, is_product, documentation);
        write_distribution(&mut w, node, ctx, is_product);
        if is_product {
            write_acquisition(&mut w, node);
        }

        w.close(root);
        Ok(w.finish())
    }
}

fn write_point_of_contact(w: &mut XmlWriter, node: &Node, url: Option<&str>) {
    w.open("gmd:CI_ResponsibleParty", &[]);
    if let Some(officer) = &node.osc_technical_officer {
        w.char_string("gmd:individualName", &officer.name);
    }
    if !node.osc_consortium.is_empty() {
        w.char_string("gmd:organisationName", &node.osc_consortium.join(", "));
    }
    let email = node.osc_technical_officer.as_ref().map(|o| o.email.as_str());
    if email.is_some() || url.is_some() {
        w.open("gmd:contactInfo", &[]);
        w.open("gmd:CI_Contact", &[]);
        if let Some(email) = email {
            w.open("gmd:address", &[]);
            w.open("gmd:CI_Address", &[]);
            w.char_string("gmd:electronicMailAddress", email);
            w.close("gmd:CI_Address");
            w.close("gmd:address");
        }
        if let Some(url) = url {
            w.open("gmd:onlineResource", &[]);
            w.open("gmd:CI_OnlineResource", &[]);
            w.open("gmd:linkage", &[]);
            w.leaf("gmd:URL", &[], url);
            w.close("gmd:linkage");
            w.close("gmd:CI_OnlineResource");
            w.close("gmd:onlineResource");
        }
        w.close("gmd:CI_Contact");
        w.close("gmd:contactInfo");
    }
    w.code(
        "gmd:role",
        "gmd:CI_RoleCode",
        &code_list("CI_RoleCode"),
        "pointOfContact",
    );
    w.close("gmd:CI_ResponsibleParty");
}

/// One `gmd:MD_Keywords` block per group: variables, themes, short name, region.
fn keyword_groups(node: &Node, is_product: bool) -> Vec<Vec<String>> {
    let mut groups: Vec<Vec<String>> = Vec::new();
    if is_product && !node.osc_variables.is_empty() {
        groups.push(
            node.osc_variables
                .iter()
                .map(|v| format!("variable:{}", v))
                .collect(),
        );
    }
    if !node.osc_themes.is_empty() {
        groups.push(node.osc_themes.iter().map(|t| format!("theme:{}", t)).collect());
    }
    if !is_product {
        if let Some(name) = &node.osc_name {
            groups.push(vec![name.clone()]);
        }
    }
    if let Some(region) = &node.osc_region {
        groups.push(vec![region.clone()]);
    }
    groups
}

fn write_identification(
    w: &mut XmlWriter,
    node: &Node,
    status: Status,
    is_product: bool,
    url: Option<&str>,
) {
    w.open("gmd:identificationInfo", &[]);
    w.open("gmd:MD_DataIdentification", &[]);

    w.open("gmd:citation", &[]);
    w.open("gmd:CI_Citation", &[]);
    w.char_string("gmd:title", node.title.as_deref().unwrap_or(&node.id));
    match node.created {
        Some(created) => {
            w.open("gmd:date", &[]);
            w.open("gmd:CI_Date", &[]);
            w.open("gmd:date", &[]);
            w.leaf("gco:DateTime", &[], &timestamp(&created));
            w.close("gmd:date");
            w.code(
                "gmd:dateType",
                "gmd:CI_DateTypeCode",
                &code_list("CI_DateTypeCode"),
                "publication",
            );
            w.close("gmd:CI_Date");
            w.close("gmd:date");
        }
        None => w.empty("gmd:date", &[("gco:nilReason", "missing")]),
    }
    if let Some(doi) = &node.sci_doi {
        w.open("gmd:identifier", &[]);
        w.open("gmd:MD_Identifier", &[]);
        w.char_string("gmd:code", doi);
        w.close("gmd:MD_Identifier");
        w.close("gmd:identifier");
    }
    w.close("gmd:CI_Citation");
    w.close("gmd:citation");

    w.char_string("gmd:abstract", &node.description);
    w.code(
        "gmd:status",
        "gmd:MD_ProgressCode",
        &code_list("MD_ProgressCode"),
        progress_code(status),
    );
    w.open("gmd:pointOfContact", &[]);
    write_point_of_contact(w, node, url);
    w.close("gmd:pointOfContact");

    w.open("gmd:resourceMaintenance", &[]);
    w.open("gmd:MD_MaintenanceInformation", &[]);
    w.code(
        "gmd:maintenanceAndUpdateFrequency",
        "gmd:MD_MaintenanceFrequencyCode",
        &code_list("MD_MaintenanceFrequencyCode"),
        "continual",
    );
    w.close("gmd:MD_MaintenanceInformation");
    w.close("gmd:resourceMaintenance");

    for group in keyword_groups(node, is_product) {
        w.open("gmd:descriptiveKeywords", &[]);
        w.open("gmd:MD_Keywords", &[]);
        for keyword in &group {
            w.char_string("gmd:keyword", keyword);
        }
        w.code(
            "gmd:type",
            "gmd:MD_KeywordTypeCode",
            &code_list("MD_KeywordTypeCode"),
            "theme",
        );
        w.close("gmd:MD_Keywords");
        w.close("gmd:descriptiveKeywords");
    }

    w.code(
        "gmd:language",
        "gmd:LanguageCode",
        "http://www.loc.gov/standards/iso639-2/",
        LANGUAGE,
    );
    w.code(
        "gmd:characterSet",
        "gmd:MD_CharacterSetCode",
        &code_list("MD_CharacterSetCode"),
        CHARSET,
    );

    if let Some(extent) = &node.extent {
        w.open("gmd:extent", &[]);
        w.open("gmd:EX_Extent", &[]);
        for bbox in &extent.spatial.bbox {
            w.open("gmd:geographicElement", &[]);
            w.open("gmd:EX_GeographicBoundingBox", &[]);
            for (tag, value) in [
                ("gmd:westBoundLongitude", bbox[0]),
                ("gmd:eastBoundLongitude", bbox[2]),
                ("gmd:southBoundLatitude", bbox[1]),
                ("gmd:northBoundLatitude", bbox[3]),
            ] {
                w.open(tag, &[]);
                w.leaf("gco:Decimal", &[], &value.to_string());
                w.close(tag);
            }
            w.close("gmd:EX_GeographicBoundingBox");
            w.close("gmd:geographicElement");
        }
        for (i, [begin, end]) in extent.temporal.interval.iter().enumerate() {
            let period_id = sanitize_id(&format!("{}-period-{}", node.id, i + 1));
            w.open("gmd:temporalElement", &[]);
            w.open("gmd:EX_TemporalExtent", &[]);
            w.open("gmd:extent", &[]);
            w.open("gml:TimePeriod", &[("gml:id", &period_id)]);
            write_position(w, "gml:beginPosition", begin.as_ref());
            write_position(w, "gml:endPosition", end.as_ref());
            w.close("gml:TimePeriod");
            w.close("gmd:extent");
            w.close("gmd:EX_TemporalExtent");
            w.close("gmd:temporalElement");
        }
        w.close("gmd:EX_Extent");
        w.close("gmd:extent");
    }

    w.close("gmd:MD_DataIdentification");
    w.close("gmd:identificationInfo");
}

fn write_position(w: &mut XmlWriter, tag: &str, value: Option<&DateTime<Utc>>) {
    match value {
        Some(value) => w.leaf(tag, &[], &timestamp(value)),
        None => w.empty(tag, &[("indeterminatePosition", "unknown")]),
    }
}

fn write_distribution(w: &mut XmlWriter, node: &Node, ctx: &FormatContext<'_>, is_product: bool) {
    let mut resources = Vec::new();
    if let Some(link) = node.titled_link(Rel::Via, "Website") {
        resources.push(OnlineResource {
            url: &link.href,
            name: "website",
            function: "information",
        });
    }
    if is_product {
        if let Some(link) = node.titled_link(Rel::Via, "Access") {
            resources.push(OnlineResource {
                url: &link.href,
                name: "access",
                function: "download",
            });
        }
    }
    resources.push(OnlineResource {
        url: ctx.self_href,
        name: "self",
        function: "information",
    });

    w.open("gmd:distributionInfo", &[]);
    w.open("gmd:MD_Distribution", &[]);
    w.open("gmd:transferOptions", &[]);
    w.open("gmd:MD_DigitalTransferOptions", &[]);
    for resource in resources {
        w.open("gmd:onLine", &[]);
        w.open("gmd:CI_OnlineResource", &[]);
        w.open("gmd:linkage", &[]);
        w.leaf("gmd:URL", &[], resource.url);
        w.close("gmd:linkage");
        w.char_string("gmd:protocol", "WWW:LINK");
        w.char_string("gmd:name", resource.name);
        w.char_string("gmd:description", resource.name);
        w.code(
            "gmd:function",
            "gmd:CI_OnLineFunctionCode",
            &code_list("CI_OnLineFunctionCode"),
            resource.function,
        );
        w.close("gmd:CI_OnlineResource");
        w.close("gmd:onLine");
    }
    w.close("gmd:MD_DigitalTransferOptions");
    w.close("gmd:transferOptions");
    w.close("gmd:MD_Distribution");
    w.close("gmd:distributionInfo");
}

fn write_acquisition(w: &mut XmlWriter, node: &Node) {
    if node.osc_missions.is_empty() {
        return;
    }
    w.open("gmi:acquisitionInformation", &[]);
    w.open("gmi:MI_AcquisitionInformation", &[]);
    for mission in &node.osc_missions {
        w.open("gmi:platform", &[]);
        w.open("gmi:MI_Platform", &[]);
        w.open("gmi:identifier", &[]);
        w.open("gmd:MD_Identifier", &[]);
        w.char_string("gmd:code", mission);
        w.close("gmd:MD_Identifier");
        w.close("gmi:identifier");
        w.char_string("gmi:description", mission);
        w.close("gmi:MI_Platform");
        w.close("gmi:platform");
    }
    w.close("gmi:MI_AcquisitionInformation");
    w.close("gmi:acquisitionInformation");
}
