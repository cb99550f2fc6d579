// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{fs, path::PathBuf};

use indoc::indoc;
use tempfile::TempDir;

use super::*;

const CHANNELS: &str = indoc! {"
    [H1:PEM-EY_MAG_EBAY_SEIRACK_X_DQ]
    configuration_file = /home/detchar/h1_pem_256.ini
    sample_rate = 256

    [H1:LSC-DARM_ERR]
    configuration_file = /home/detchar/h1_lsc_16384.ini
    sample_rate = 16384
    downsample_rate = 4096
    dq_channel = LSC-ODC_CHANNEL_OUT_DQ
    on_bits = 0x1
    off_bits =
"};

#[test]
fn test_channel_sections_in_order() {
    let config = ChannelConfig::parse(CHANNELS).unwrap();
    assert_eq!(
        config.section_names(),
        vec!["H1:PEM-EY_MAG_EBAY_SEIRACK_X_DQ", "H1:LSC-DARM_ERR"]
    );

    let channels = config.channels().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(channels.len(), 2);

    let pem = &channels[0];
    assert_eq!(pem.name.subsystem, "PEM");
    assert_eq!(pem.sample_rate, 256);
    assert_eq!(
        pem.configuration_file,
        PathBuf::from("/home/detchar/h1_pem_256.ini")
    );
    // Optional things are disabled when missing.
    assert!(pem.downsample_rate.is_none());
    assert!(pem.dq.is_none());

    let darm = &channels[1];
    assert_eq!(darm.downsample_rate, Some(4096));
    let dq = darm.dq.as_ref().unwrap();
    assert_eq!(dq.channel, "LSC-ODC_CHANNEL_OUT_DQ");
    assert_eq!(dq.on_bits, Some(1));
    assert_eq!(dq.off_bits, None);
}

#[test]
fn test_named_channel() {
    let config = ChannelConfig::parse(CHANNELS).unwrap();
    let darm = config.channel("H1:LSC-DARM_ERR").unwrap();
    assert_eq!(darm.sample_rate, 16384);
    assert!(matches!(
        config.channel("L1:LSC-DARM_ERR"),
        Err(ConfigError::MissingSection(_))
    ));
}

#[test]
fn test_missing_required_keys() {
    let config = ChannelConfig::parse(indoc! {"
        [H1:PEM-EY_MAG]
        sample_rate = 256
    "})
    .unwrap();
    let result = config.channel("H1:PEM-EY_MAG");
    assert!(matches!(
        result,
        Err(ConfigError::MissingKey {
            key: "configuration_file",
            ..
        })
    ));

    let config = ChannelConfig::parse(indoc! {"
        [H1:PEM-EY_MAG]
        configuration_file = a.ini
        sample_rate = fast
    "})
    .unwrap();
    assert!(matches!(
        config.channel("H1:PEM-EY_MAG"),
        Err(ConfigError::BadValue { .. })
    ));
}

#[test]
fn test_malformed_section_name() {
    let config = ChannelConfig::parse(indoc! {"
        [PEM-EY_MAG]
        configuration_file = a.ini
        sample_rate = 256
    "})
    .unwrap();
    assert!(matches!(
        config.channel("PEM-EY_MAG"),
        Err(ConfigError::ChannelName(_))
    ));
}

#[test]
fn test_odc_channel_alias_and_hex_bits() {
    let config = ChannelConfig::parse(indoc! {"
        [L1:ASC-X_TR_A]
        configuration_file = a.ini
        sample_rate = 2048
        odc_channel = ASC-ODC_CHANNEL_OUT_DQ
        on_bits = 0X1f
        off_bits = 2
    "})
    .unwrap();
    let dq = config.channel("L1:ASC-X_TR_A").unwrap().dq.unwrap();
    assert_eq!(dq.channel, "ASC-ODC_CHANNEL_OUT_DQ");
    assert_eq!(dq.on_bits, Some(0x1f));
    assert_eq!(dq.off_bits, Some(0x2));
}

#[test]
fn test_unreadable_channel_config_is_fatal() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let result = ChannelConfig::read(tmp_dir.path().join("doesnt_exist.ini"));
    assert!(matches!(result, Err(ConfigError::Read { .. })));
}

#[test]
fn test_program_config_attrs() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let path = tmp_dir.path().join("ep.ini");
    fs::write(
        &path,
        indoc! {"
            [tf_parameters]
            min-frequency = 8
            max-frequency = 128

            [triggering]
            output-directory = /home/detchar/triggers
        "},
    )
    .unwrap();

    let mut config = ProgramConfig::read(&path).unwrap();
    assert_eq!(config.path(), path.as_path());
    assert_eq!(
        config.get_attr("output_directory"),
        Some("/home/detchar/triggers")
    );
    assert_eq!(config.require_attr("max-frequency").unwrap(), "128");
    assert!(config.get_attr("snr_threshold").is_none());
    assert!(matches!(
        config.require_attr("snr_threshold"),
        Err(ConfigError::MissingAttribute { .. })
    ));

    assert!(config.set_attr("min_frequency", "16"));
    assert!(!config.set_attr("snr_threshold", "5"));
    assert_eq!(config.get_attr("min-frequency"), Some("16"));

    // Writing moves the config to its new home.
    let copy = tmp_dir.path().join("copy.ini");
    config.write(&copy).unwrap();
    assert_eq!(config.path(), copy.as_path());
    let reread = ProgramConfig::read(&copy).unwrap();
    assert_eq!(reread.get_attr("min-frequency"), Some("16"));
    assert_eq!(
        reread.get_attr("output-directory"),
        Some("/home/detchar/triggers")
    );
}

#[test]
fn test_parse_channel_list() {
    let entries = parse_channel_list(indoc! {"
        # channel rate
        H1:PEM-EY_MAG_EBAY_SEIRACK_X_DQ 256

        H1:PEM-ODC_CHANNEL_OUT_DQ 256
    "})
    .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].sample_rate, 256);
    assert_eq!(entries[1].name.channel, "PEM-ODC_CHANNEL_OUT_DQ");

    let result = parse_channel_list("H1:PEM-EY_MAG\n");
    assert!(matches!(
        result,
        Err(ConfigError::BadChannelListLine { line_num: 1, .. })
    ));
    let result = parse_channel_list("H1:PEM-EY_MAG 256\nH1:PEM-EY_MAG fast\n");
    assert!(matches!(
        result,
        Err(ConfigError::BadChannelListLine { line_num: 2, .. })
    ));
}

#[test]
fn test_infer_dq_channel() {
    let dq = vec![
        "ASC-ODC_CHANNEL_OUT_DQ".to_string(),
        "PEM-EY_ODC_CHANNEL_OUT_DQ".to_string(),
        "PEM-ODC_CHANNEL_OUT_DQ".to_string(),
    ];
    assert_eq!(
        infer_dq_channel("PEM-EY_MAG_EBAY_SEIRACK_X_DQ", &dq),
        Some("PEM-EY_ODC_CHANNEL_OUT_DQ")
    );
    assert_eq!(
        infer_dq_channel("ASC-X_TR_A_NSUM_OUT_DQ", &dq),
        Some("ASC-ODC_CHANNEL_OUT_DQ")
    );
    // Without a subsystem match, the name that sorts last wins.
    assert_eq!(
        infer_dq_channel("SUS-ETMX_L3", &dq),
        Some("PEM-ODC_CHANNEL_OUT_DQ")
    );
    assert_eq!(infer_dq_channel("SUS-ETMX_L3", &[]), None);
}

#[test]
fn test_make_and_write_channel_sections() {
    let entries = parse_channel_list(indoc! {"
        H1:PEM-EY_MAG_EBAY_SEIRACK_X_DQ 256
        H1:PEM-EY_ODC_CHANNEL_OUT_DQ 256
        H1:ASC-X_TR_A_NSUM_OUT_DQ 2048
        L1:PEM-EY_MAG_EBAY_SEIRACK_X_DQ 256
    "})
    .unwrap();
    let sections = make_channel_sections(&entries, Path::new("/home/detchar/excesspower"));
    // The ODC channel isn't analysed.
    assert_eq!(sections.len(), 3);
    assert_eq!(
        sections[0].dq_channel.as_deref(),
        Some("PEM-EY_ODC_CHANNEL_OUT_DQ")
    );
    assert_eq!(
        sections[0].configuration_file,
        PathBuf::from(
            "/home/detchar/excesspower/H1/channel_ini/gstlal_excesspower_h1_pem_256.ini"
        )
    );
    assert_eq!(
        sections[1].dq_channel.as_deref(),
        Some("PEM-EY_ODC_CHANNEL_OUT_DQ")
    );
    // L1 has no ODC channels of its own.
    assert_eq!(sections[2].dq_channel, None);

    // What's generated must be readable as a channel configuration.
    let text = sections_to_string(&sections).unwrap();
    let config = ChannelConfig::parse(&text).unwrap();
    let channels = config.channels().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(channels.len(), 3);
    assert_eq!(channels[1].sample_rate, 2048);
    assert_eq!(channels[0].dq.as_ref().unwrap().on_bits, Some(1));
    assert_eq!(channels[0].dq.as_ref().unwrap().off_bits, Some(0));
    assert!(channels[2].dq.is_none());

    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let written = write_subsystem_configs(&sections, tmp_dir.path(), false).unwrap();
    assert_eq!(
        written,
        vec![
            tmp_dir.path().join("H1").join("asc_channels.ini"),
            tmp_dir.path().join("H1").join("pem_channels.ini"),
            tmp_dir.path().join("L1").join("pem_channels.ini"),
        ]
    );

    // Appending keeps what was there.
    let extra = make_channel_sections(
        &parse_channel_list("H1:PEM-EX_MAG_EBAY_SEIRACK_X_DQ 512").unwrap(),
        Path::new("/ini"),
    );
    write_subsystem_configs(&extra, tmp_dir.path(), true).unwrap();
    let config = ChannelConfig::read(tmp_dir.path().join("H1").join("pem_channels.ini")).unwrap();
    assert_eq!(config.section_names().len(), 2);

    // Not appending replaces.
    write_subsystem_configs(&extra, tmp_dir.path(), false).unwrap();
    let config = ChannelConfig::read(tmp_dir.path().join("H1").join("pem_channels.ini")).unwrap();
    assert_eq!(config.section_names().len(), 1);
}
