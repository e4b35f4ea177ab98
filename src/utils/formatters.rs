// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! Canonical string rendering for assets and addresses.

use crate::ledger::types::Asset;

/// Render an asset into its canonical market key: `XLM` for the native
/// asset, `CODE:ISSUER` for issued credit assets.
pub fn format_asset(asset: &Asset) -> String {
    match asset {
        Asset::Native => "XLM".to_string(),
        Asset::CreditAlphanum4 { code, issuer } => format!("{code}:{issuer}"),
        Asset::CreditAlphanum12 { code, issuer } => format!("{code}:{issuer}"),
    }
}

/// Detect a Stellar Asset Contract by its `code:Gissuer` formatted name and
/// split it into the classic (code, issuer) pair.
pub fn parse_sac_name(name: &str) -> Option<(&str, &str)> {
    let mut parts = name.split(':');
    let code = parts.next()?;
    let issuer = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    if !issuer.starts_with('G') {
        return None;
    }
    Some((code, issuer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_asset_renders_as_xlm() {
        assert_eq!(format_asset(&Asset::Native), "XLM");
    }

    #[test]
    fn issued_assets_render_code_and_issuer() {
        let asset = Asset::CreditAlphanum4 {
            code: "USDC".to_string(),
            issuer: "GA5ZSEJYB37JRC5AVCIA5MOP4RHTM335X2KGX3IHOJAPP5RE34K4KZVN".to_string(),
        };
        assert_eq!(
            format_asset(&asset),
            "USDC:GA5ZSEJYB37JRC5AVCIA5MOP4RHTM335X2KGX3IHOJAPP5RE34K4KZVN"
        );
    }

    #[test]
    fn sac_name_detection() {
        let (code, issuer) =
            parse_sac_name("yUSD:GDGTVWSM4MGS4T7Z6W4RPWOCHE2I6RDFCIFZGS3DOA63LWQTRNZNTTFF")
                .unwrap();
        assert_eq!(code, "yUSD");
        assert_eq!(issuer, "GDGTVWSM4MGS4T7Z6W4RPWOCHE2I6RDFCIFZGS3DOA63LWQTRNZNTTFF");

        assert!(parse_sac_name("Wrapped Bitcoin").is_none());
        assert!(parse_sac_name("a:b:c").is_none());
        assert!(parse_sac_name("USDC:notanissuer").is_none());
    }
}
