use std::collections::HashMap;

/// Human-readable app names the model is likely to use, mapped to package ids.
const BUILTIN_APPS: &[(&str, &str)] = &[
    ("Settings", "com.android.settings"),
    ("设置", "com.android.settings"),
    ("Chrome", "com.android.chrome"),
    ("Camera", "com.android.camera"),
    ("相机", "com.android.camera"),
    ("Play Store", "com.android.vending"),
    ("YouTube", "com.google.android.youtube"),
    ("Gmail", "com.google.android.gm"),
    ("Google Maps", "com.google.android.apps.maps"),
    ("Taobao", "com.taobao.taobao"),
    ("淘宝", "com.taobao.taobao"),
    ("WeChat", "com.tencent.mm"),
    ("微信", "com.tencent.mm"),
    ("QQ", "com.tencent.mobileqq"),
    ("Alipay", "com.eg.android.AlipayGphone"),
    ("支付宝", "com.eg.android.AlipayGphone"),
    ("Douyin", "com.ss.android.ugc.aweme"),
    ("抖音", "com.ss.android.ugc.aweme"),
    ("JD", "com.jingdong.app.mall"),
    ("京东", "com.jingdong.app.mall"),
    ("Meituan", "com.sankuai.meituan"),
    ("美团", "com.sankuai.meituan"),
    ("Xiaohongshu", "com.xingin.xhs"),
    ("小红书", "com.xingin.xhs"),
    ("Bilibili", "tv.danmaku.bili"),
    ("哔哩哔哩", "tv.danmaku.bili"),
    ("Amap", "com.autonavi.minimap"),
    ("高德地图", "com.autonavi.minimap"),
];

/// Case-insensitive app name → package table.
#[derive(Debug, Clone)]
pub struct AppTable {
    by_key: HashMap<String, String>,
    names: Vec<String>,
}

impl AppTable {
    pub fn builtin() -> Self {
        Self::with_overrides(&HashMap::new())
    }

    /// Built-in entries plus `extra`; an extra entry replaces a built-in one with the same name.
    pub fn with_overrides(extra: &HashMap<String, String>) -> Self {
        let mut table = Self {
            by_key: HashMap::new(),
            names: Vec::new(),
        };
        let builtin = BUILTIN_APPS.iter().map(|(n, p)| (n.to_string(), p.to_string()));
        let extra = extra.iter().map(|(n, p)| (n.clone(), p.clone()));
        for (name, package) in builtin.chain(extra) {
            table.insert(name, package);
        }
        table
    }

    fn insert(&mut self, name: String, package: String) {
        let key = normalize(&name);
        if key.is_empty() {
            return;
        }
        if self.by_key.insert(key, package).is_none() {
            self.names.push(name);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.by_key.get(&normalize(name)).map(String::as_str)
    }

    /// Package id for `name`, or the name itself as a best-effort identifier.
    pub fn resolve(&self, name: &str) -> String {
        match self.lookup(name) {
            Some(package) => package.to_string(),
            None => {
                tracing::debug!(app = %name, "app not in table, passing through verbatim");
                name.trim().to_string()
            }
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_case_insensitively() {
        let table = AppTable::builtin();
        assert_eq!(table.resolve("settings"), "com.android.settings");
        assert_eq!(table.resolve("  WeChat "), "com.tencent.mm");
        assert_eq!(table.resolve("淘宝"), "com.taobao.taobao");
    }

    #[test]
    fn unknown_names_pass_through() {
        let table = AppTable::builtin();
        assert_eq!(table.lookup("org.example.app"), None);
        assert_eq!(table.resolve(" org.example.app "), "org.example.app");
    }

    #[test]
    fn overrides_replace_and_extend() {
        let extra = HashMap::from([
            ("chrome".to_string(), "org.chromium.chrome".to_string()),
            ("Notes".to_string(), "com.example.notes".to_string()),
        ]);
        let table = AppTable::with_overrides(&extra);
        assert_eq!(table.resolve("Chrome"), "org.chromium.chrome");
        assert_eq!(table.resolve("notes"), "com.example.notes");
        assert!(table.names().iter().any(|n| n == "Notes"));
        // the replaced entry keeps a single display name
        assert_eq!(table.names().iter().filter(|n| n.eq_ignore_ascii_case("chrome")).count(), 1);
    }
}
