//! Agency to CFR title matching.
//!
//! Decides whether a Federal Register agency belongs to one of the 50 titles
//! of the Code of Federal Regulations. Matching is plain case-insensitive
//! substring search, first against a keyword table and then against the
//! title names themselves. It is deliberately permissive: any agency whose
//! name contains a keyword matches, whatever sub-office it actually is.

/// The 50 CFR titles, as listed on www.ecfr.gov.
pub const CFR_TITLES: [(u8, &str); 50] = [
    (1, "General Provisions"),
    (2, "Grants and Agreements"),
    (3, "The President"),
    (4, "Accounts"),
    (5, "Administrative Personnel"),
    (6, "Domestic Security"),
    (7, "Agriculture"),
    (8, "Aliens and Nationality"),
    (9, "Animals and Animal Products"),
    (10, "Energy"),
    (11, "Federal Elections"),
    (12, "Banks and Banking"),
    (13, "Business Credit and Assistance"),
    (14, "Aeronautics and Space"),
    (15, "Commerce and Foreign Trade"),
    (16, "Commercial Practices"),
    (17, "Commodity and Securities Exchanges"),
    (18, "Conservation of Power and Water Resources"),
    (19, "Customs Duties"),
    (20, "Employees' Benefits"),
    (21, "Food and Drugs"),
    (22, "Foreign Relations"),
    (23, "Highways"),
    (24, "Housing and Urban Development"),
    (25, "Indians"),
    (26, "Internal Revenue"),
    (27, "Alcohol, Tobacco Products and Firearms"),
    (28, "Judicial Administration"),
    (29, "Labor"),
    (30, "Mineral Resources"),
    (31, "Money and Finance: Treasury"),
    (32, "National Defense"),
    (33, "Navigation and Navigable Waters"),
    (34, "Education"),
    (35, "Panama Canal"),
    (36, "Parks, Forests, and Public Property"),
    (37, "Patents, Trademarks, and Copyrights"),
    (38, "Pensions, Bonuses, and Veterans' Relief"),
    (39, "Postal Service"),
    (40, "Protection of Environment"),
    (41, "Public Contracts and Property Management"),
    (42, "Public Health"),
    (43, "Public Lands: Interior"),
    (44, "Emergency Management and Assistance"),
    (45, "Public Welfare"),
    (46, "Shipping"),
    (47, "Telecommunication"),
    (48, "Federal Acquisition Regulations System"),
    (49, "Transportation"),
    (50, "Wildlife and Fisheries"),
];

/// Agency name keywords and the CFR title each one points at.
pub const AGENCY_KEYWORDS: [(&str, u8); 32] = [
    ("Agriculture", 7),
    ("Air Force", 32),
    ("Army", 32),
    ("Coast Guard", 33),
    ("Commerce", 15),
    ("Defense", 32),
    ("Education", 34),
    ("Energy", 10),
    ("Environmental Protection", 40),
    ("Federal Aviation", 14),
    ("Federal Communications", 47),
    ("Federal Election", 11),
    ("Federal Trade", 16),
    ("Food and Drug", 21),
    ("Health and Human Services", 42),
    ("Homeland Security", 6),
    ("Housing and Urban Development", 24),
    ("Interior", 43),
    ("Internal Revenue", 26),
    ("Justice", 28),
    ("Labor", 29),
    ("National Aeronautics", 14),
    ("Navy", 32),
    ("Nuclear Regulatory", 10),
    ("Postal Service", 39),
    ("Securities and Exchange", 17),
    ("Small Business", 13),
    ("Social Security", 20),
    ("State Department", 22),
    ("Transportation", 49),
    ("Treasury", 31),
    ("Veterans Affairs", 38),
];

/// Returns true when `agency_name` corresponds to a CFR title agency.
pub fn matches(agency_name: &str) -> bool {
    cfr_title_for(agency_name).is_some()
}

/// CFR title number for an agency name, if it matches at all.
///
/// Keyword hits win over title-name hits; within each table the first
/// entry in table order is reported.
pub fn cfr_title_for(agency_name: &str) -> Option<u8> {
    if agency_name.trim().is_empty() {
        return None;
    }
    let upper = agency_name.to_uppercase();

    if let Some((_, title)) = AGENCY_KEYWORDS
        .iter()
        .find(|(keyword, _)| upper.contains(&keyword.to_uppercase()))
    {
        return Some(*title);
    }

    CFR_TITLES
        .iter()
        .find(|(_, title_name)| {
            let title_upper = title_name.to_uppercase();
            upper.contains(&title_upper) || title_upper.contains(&upper)
        })
        .map(|(number, _)| *number)
}

/// Name of a CFR title by number.
pub fn cfr_title_name(number: u8) -> Option<&'static str> {
    CFR_TITLES
        .iter()
        .find(|(n, _)| *n == number)
        .map(|(_, name)| *name)
}
