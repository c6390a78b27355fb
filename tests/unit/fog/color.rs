use super::*;

#[test]
fn eight_digit_color_carries_opacity() {
    let c = FogColor::parse("#112233FF").unwrap();
    assert_eq!(c.color, "#112233");
    assert_eq!(c.opacity, 1.0);
}

#[test]
fn six_digit_color_defaults_to_half_opacity() {
    let c = FogColor::parse("#AbCdEf").unwrap();
    assert_eq!(c.color, "#abcdef");
    assert_eq!(c.opacity, 0.5);
}

#[test]
fn default_matches_default_setting_string() {
    assert_eq!(FogColor::parse("#00000088").unwrap(), FogColor::default());
}

#[test]
fn invalid_colors_are_rejected_and_fall_back() {
    assert!(FogColor::parse("#12345").is_err());
    assert!(FogColor::parse("#zz0000").is_err());
    assert!(FogColor::parse("#ééé").is_err());
    assert_eq!(FogColor::from_setting(Some("nope")), FogColor::default());
    assert_eq!(FogColor::from_setting(None), FogColor::default());
}
