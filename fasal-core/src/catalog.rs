//! Closed option lists offered by the purchase wizard.

pub const STATES: &[&str] = &[
    "Maharashtra",
    "Punjab",
    "Haryana",
    "Uttar Pradesh",
    "Madhya Pradesh",
    "Gujarat",
    "Rajasthan",
    "Karnataka",
    "Andhra Pradesh",
    "Tamil Nadu",
];

pub const CROPS: &[&str] = &[
    "Rice",
    "Wheat",
    "Cotton",
    "Sugarcane",
    "Maize",
    "Soybean",
    "Onion",
    "Potato",
    "Tomato",
    "Groundnut",
];

/// Districts of a state. Unknown states have none.
pub fn districts(state: &str) -> &'static [&'static str] {
    match state {
        "Maharashtra" => &["Pune", "Mumbai", "Nashik", "Aurangabad", "Nagpur"],
        "Punjab" => &["Ludhiana", "Amritsar", "Jalandhar", "Patiala", "Bathinda"],
        "Haryana" => &["Karnal", "Hisar", "Rohtak", "Panipat", "Sirsa"],
        "Uttar Pradesh" => &["Lucknow", "Kanpur", "Varanasi", "Meerut", "Gorakhpur"],
        "Madhya Pradesh" => &["Bhopal", "Indore", "Jabalpur", "Gwalior", "Ujjain"],
        "Gujarat" => &["Ahmedabad", "Rajkot", "Surat", "Vadodara", "Junagadh"],
        "Rajasthan" => &["Jaipur", "Jodhpur", "Kota", "Bikaner", "Udaipur"],
        "Karnataka" => &["Bengaluru Rural", "Mysuru", "Belagavi", "Dharwad", "Raichur"],
        "Andhra Pradesh" => &["Guntur", "Krishna", "Kurnool", "Anantapur", "Nellore"],
        "Tamil Nadu" => &["Thanjavur", "Coimbatore", "Madurai", "Salem", "Tiruchirappalli"],
        _ => &[],
    }
}

pub fn is_known_state(state: &str) -> bool {
    STATES.contains(&state)
}

pub fn is_known_crop(crop: &str) -> bool {
    CROPS.contains(&crop)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_state_has_districts() {
        for state in STATES {
            assert!(!districts(state).is_empty(), "{state} has no districts");
        }
        assert!(districts("Atlantis").is_empty());
        assert!(districts("").is_empty());
    }

    #[test]
    fn test_membership() {
        assert!(is_known_state("Tamil Nadu"));
        assert!(!is_known_state("tamil nadu"));
        assert!(is_known_crop("Groundnut"));
        assert_eq!(CROPS.len(), 10);
    }
}
