use super::fingerprint::BrowserProfile;
use lucid_common::StealthLevel;

/// Construct Chrome command-line arguments for a stealth level and
/// session profile.
pub fn build_stealth_arguments(level: StealthLevel, profile: &BrowserProfile) -> Vec<String> {
    let mut args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-infobars".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--no-sandbox".to_string(),
        "--disable-extensions".to_string(),
        "--disable-plugins-discovery".to_string(),
        format!("--user-agent={}", profile.user_agent),
        format!("--window-size={},{}", profile.viewport.0, profile.viewport.1),
        format!("--lang={}", profile.locale),
    ];
    if let StealthLevel::Maximum = level {
        args.push("--disable-gpu".to_string());
    }
    args
}

/// JavaScript evasions registered before navigation so they run ahead of
/// the page's own scripts.
pub struct StealthScripts;

impl StealthScripts {
    pub fn core_evasions() -> &'static str {
        r#"
            Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
            Object.defineProperty(navigator, 'plugins', { get: () => [1,2,3] });
            if (!window.chrome) window.chrome = { runtime: {} };
        "#
    }

    /// Align `navigator.languages` and the reported time zone with the
    /// session profile.
    pub fn locale_overrides(profile: &BrowserProfile) -> String {
        let languages = serde_json::to_string(&profile.languages).unwrap_or_else(|_| "[]".into());
        let timezone = serde_json::to_string(&profile.timezone).unwrap_or_else(|_| "\"UTC\"".into());
        format!(
            r#"
            Object.defineProperty(navigator, 'languages', {{ get: () => {languages} }});
            const resolved = Intl.DateTimeFormat.prototype.resolvedOptions;
            Intl.DateTimeFormat.prototype.resolvedOptions = function() {{
                const opts = resolved.call(this);
                opts.timeZone = {timezone};
                return opts;
            }};
            "#
        )
    }

    pub fn platform_override(profile: &BrowserProfile) -> String {
        let platform = serde_json::to_string(&profile.platform).unwrap_or_else(|_| "\"\"".into());
        format!("Object.defineProperty(navigator, 'platform', {{ get: () => {platform} }});")
    }

    pub fn webgl_evasions() -> &'static str {
        r#"
            const getParameter = WebGLRenderingContext.prototype.getParameter;
            WebGLRenderingContext.prototype.getParameter = function(parameter) {
                if (parameter === 37445) return 'Intel Inc.';
                if (parameter === 37446) return 'Intel Iris OpenGL Engine';
                return getParameter.call(this, parameter);
            };
        "#
    }

    pub fn canvas_evasions() -> &'static str {
        r#"
            const getContext = HTMLCanvasElement.prototype.getContext;
            HTMLCanvasElement.prototype.getContext = function(type,...args){
                const ctx = getContext.call(this,type,...args);
                if(type==='2d' && ctx) {
                    const origToDataURL=this.toDataURL;
                    this.toDataURL=function(...a){
                        const imgdata=ctx.getImageData(0,0,this.width,this.height);
                        for(let i=0;i<imgdata.data.length;i+=4){
                            if(Math.random()<0.001)imgdata.data[i]+=Math.random()<0.5?-1:1;
                        }
                        ctx.putImageData(imgdata,0,0);
                        return origToDataURL.call(this,...a);
                    };
                }
                return ctx;
            };
        "#
    }

    /// All scripts for `level`, in execution order.
    pub fn for_level(level: StealthLevel, profile: &BrowserProfile) -> Vec<String> {
        let mut scripts = vec![
            Self::core_evasions().to_string(),
            Self::locale_overrides(profile),
        ];
        match level {
            StealthLevel::Lightweight => {}
            StealthLevel::Balanced => scripts.push(Self::canvas_evasions().to_string()),
            StealthLevel::Maximum => {
                scripts.push(Self::canvas_evasions().to_string());
                scripts.push(Self::webgl_evasions().to_string());
                scripts.push(Self::platform_override(profile));
            }
        }
        scripts
    }
}
