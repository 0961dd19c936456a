//! Request and response shapes of the oracle HTTP contract.
//!
//! Response DTOs stay private; each one is validated and converted into a
//! domain type at the boundary so malformed payloads never reach the engine.

use std::collections::BTreeMap;

use rig_core::{
    validate_catalog, Catalog, CatalogEquipment, CatalogPanel, EquipmentCategory, RegionCode,
    RegionInfo, SelectedEquipment, Viability, ViabilityBreakdown, DEFAULT_TARIFF_PER_KWH,
};
use serde::{Deserialize, Serialize};

use crate::OracleError;

/// One selected equipment line as the oracle expects it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquipmentLine {
    #[serde(rename = "consumo")]
    pub power_w: f64,
    #[serde(rename = "custo")]
    pub unit_cost: f64,
    #[serde(rename = "hashrate")]
    pub hashrate_th: f64,
    #[serde(rename = "quantidade")]
    pub quantity: u32,
}

impl From<&SelectedEquipment> for EquipmentLine {
    fn from(s: &SelectedEquipment) -> Self {
        Self {
            power_w: s.item.power_w,
            unit_cost: s.item.unit_cost,
            hashrate_th: s.item.hashrate_th,
            quantity: s.quantity,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentSimulationRequest {
    #[serde(rename = "equipamentos")]
    pub equipment: Vec<EquipmentLine>,
}

impl EquipmentSimulationRequest {
    pub fn from_selections<'a, I>(selections: I) -> Self
    where
        I: IntoIterator<Item = &'a SelectedEquipment>,
    {
        Self {
            equipment: selections.into_iter().map(EquipmentLine::from).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolarSimulationRequest {
    #[serde(rename = "quantidade_paineis")]
    pub panel_count: u64,
    /// Mean rated power per panel, whole watts.
    #[serde(rename = "potencia_painel")]
    pub panel_power_w: u64,
    #[serde(rename = "estado")]
    pub region: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViabilityRequest {
    #[serde(rename = "estado")]
    pub region: String,
    #[serde(rename = "equipamentos")]
    pub equipment: Vec<EquipmentLine>,
    #[serde(rename = "quantidade_paineis")]
    pub panel_count: u64,
    #[serde(rename = "potencia_painel")]
    pub panel_power_w: u64,
    #[serde(rename = "custo_sistema_solar", skip_serializing_if = "Option::is_none")]
    pub solar_system_cost: Option<f64>,
    /// Tariff override; omitted lets the oracle use its regional tariff.
    #[serde(rename = "custo_energia", skip_serializing_if = "Option::is_none")]
    pub energy_tariff: Option<f64>,
    #[serde(rename = "orcamento_total")]
    pub budget: f64,
}

/// Authoritative equipment totals.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EquipmentSimulation {
    pub power_w: f64,
    pub cost: f64,
    pub hashrate_th: f64,
    pub monthly_energy_kwh: f64,
    /// Absent in older oracle builds.
    pub daily_energy_kwh: Option<f64>,
}

/// Authoritative solar yield.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SolarSimulation {
    pub generation_kwh: f64,
    pub footprint_m2: Option<f64>,
    pub system_power_kw: Option<f64>,
}

/// Optional `erro` member carried by domain failures.
#[derive(Deserialize)]
pub(crate) struct ErrorEnvelope {
    #[serde(default)]
    erro: Option<String>,
}

/// Extract a non-blank domain error message from a response body.
pub(crate) fn domain_error(body: &[u8]) -> Option<String> {
    let env: ErrorEnvelope = serde_json::from_slice(body).ok()?;
    env.erro
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}

fn required(field: &str, value: Option<f64>) -> Result<f64, OracleError> {
    match value {
        Some(v) => non_negative(field, v),
        None => Err(OracleError::InvalidField {
            field: field.to_string(),
            reason: "missing".into(),
        }),
    }
}

fn optional(field: &str, value: Option<f64>) -> Result<Option<f64>, OracleError> {
    value.map(|v| non_negative(field, v)).transpose()
}

fn non_negative(field: &str, v: f64) -> Result<f64, OracleError> {
    if !v.is_finite() || v < 0.0 {
        return Err(OracleError::InvalidField {
            field: field.to_string(),
            reason: format!("expected a non-negative number, got {v}"),
        });
    }
    Ok(v)
}

#[derive(Debug, Deserialize)]
pub(crate) struct EquipmentSimulationWire {
    consumo_total_w: Option<f64>,
    custo_equipamentos: Option<f64>,
    hashrate_total_th: Option<f64>,
    consumo_mensal_kwh: Option<f64>,
    consumo_diario_kwh: Option<f64>,
}

impl EquipmentSimulationWire {
    pub(crate) fn into_domain(self) -> Result<EquipmentSimulation, OracleError> {
        Ok(EquipmentSimulation {
            power_w: required("consumo_total_w", self.consumo_total_w)?,
            cost: required("custo_equipamentos", self.custo_equipamentos)?,
            hashrate_th: required("hashrate_total_th", self.hashrate_total_th)?,
            monthly_energy_kwh: required("consumo_mensal_kwh", self.consumo_mensal_kwh)?,
            daily_energy_kwh: optional("consumo_diario_kwh", self.consumo_diario_kwh)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SolarSimulationWire {
    geracao_solar_kwh: Option<f64>,
    area_total_m2: Option<f64>,
    potencia_sistema_kw: Option<f64>,
}

impl SolarSimulationWire {
    pub(crate) fn into_domain(self) -> Result<SolarSimulation, OracleError> {
        Ok(SolarSimulation {
            generation_kwh: required("geracao_solar_kwh", self.geracao_solar_kwh)?,
            footprint_m2: optional("area_total_m2", self.area_total_m2)?,
            system_power_kw: optional("potencia_sistema_kw", self.potencia_sistema_kw)?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BreakdownWire {
    energia_solar_utilizada: f64,
    deficit_energetico: f64,
    custo_manutencao_mensal: f64,
    preco_bitcoin: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ViabilityWire {
    cobertura_solar: f64,
    economia_mensal: f64,
    receita_mineracao_mensal: f64,
    payback_meses: f64,
    co2_evitado_kg: f64,
    btc_mensal: Option<f64>,
    investimento_total: f64,
    preco_bitcoin_brl: f64,
    custo_energia_kwh: f64,
    custo_energia_total_sem_solar: f64,
    custo_energia_deficit: f64,
    lucro_liquido_mensal: f64,
    viabilidade: Option<serde_json::Value>,
    detalhes_calculo: BreakdownWire,
}

impl ViabilityWire {
    /// Savings and profit may be negative; only non-finite values are rejected.
    pub(crate) fn into_domain(self) -> Result<Viability, OracleError> {
        let v = Viability {
            coverage_pct: self.cobertura_solar,
            monthly_savings: self.economia_mensal,
            monthly_mining_revenue: self.receita_mineracao_mensal,
            payback_months: self.payback_meses,
            avoided_co2_kg: self.co2_evitado_kg,
            monthly_coin: optional("btc_mensal", self.btc_mensal)?,
            total_investment: self.investimento_total,
            coin_price: self.preco_bitcoin_brl,
            energy_tariff: self.custo_energia_kwh,
            energy_cost_without_solar: self.custo_energia_total_sem_solar,
            energy_deficit_cost: self.custo_energia_deficit,
            net_monthly_profit: self.lucro_liquido_mensal,
            verdict: self.viabilidade.filter(|v| !v.is_null()),
            breakdown: ViabilityBreakdown {
                solar_energy_used_kwh: self.detalhes_calculo.energia_solar_utilizada,
                energy_deficit_kwh: self.detalhes_calculo.deficit_energetico,
                monthly_maintenance_cost: self.detalhes_calculo.custo_manutencao_mensal,
                coin_price: self.detalhes_calculo.preco_bitcoin,
            },
        };
        non_negative("cobertura_solar", v.coverage_pct)?;
        non_negative("investimento_total", v.total_investment)?;
        Ok(v)
    }
}

#[derive(Debug, Deserialize)]
struct RegionWire {
    nome: String,
    #[serde(default)]
    irradiacao: f64,
    #[serde(default)]
    fator_emissao: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TariffWire {
    #[serde(default)]
    tarifa: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct EquipmentWire {
    modelo: String,
    #[serde(default)]
    fabricante: String,
    #[serde(default)]
    consumo_w: f64,
    #[serde(default)]
    hashrate_th: f64,
    #[serde(default)]
    custo_aproximado: f64,
}

#[derive(Debug, Deserialize)]
struct PanelWire {
    modelo: String,
    #[serde(default)]
    tipo: String,
    #[serde(default)]
    potencia_w: f64,
    #[serde(default)]
    preco: f64,
    #[serde(default)]
    custo_por_watt: f64,
    #[serde(default)]
    largura_m: f64,
    #[serde(default)]
    altura_m: f64,
    #[serde(default)]
    eficiencia: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InitialDataWire {
    estados: BTreeMap<String, RegionWire>,
    #[serde(default)]
    tarifas: BTreeMap<String, TariffWire>,
    #[serde(default)]
    equipamentos: BTreeMap<String, Vec<EquipmentWire>>,
    #[serde(default)]
    paineis_solares: Vec<PanelWire>,
}

impl InitialDataWire {
    /// Regions without a published tariff fall back to [`DEFAULT_TARIFF_PER_KWH`].
    /// Unknown equipment families are dropped.
    pub(crate) fn into_catalog(self) -> Result<Catalog, OracleError> {
        let mut catalog = Catalog::default();
        for (code, r) in self.estados {
            let tariff = self
                .tarifas
                .get(&code)
                .and_then(|t| t.tarifa)
                .unwrap_or(DEFAULT_TARIFF_PER_KWH);
            let code = RegionCode(code);
            catalog.regions.insert(
                code.clone(),
                RegionInfo {
                    code,
                    name: r.nome,
                    irradiance_kwh_m2_day: r.irradiacao,
                    tariff_per_kwh: tariff,
                    emission_factor: r.fator_emissao,
                },
            );
        }
        for (family, items) in self.equipamentos {
            let Ok(category) = family.parse::<EquipmentCategory>() else {
                tracing::warn!(family = %family, "skipping unknown equipment family");
                continue;
            };
            let items = items
                .into_iter()
                .map(|e| CatalogEquipment {
                    model: e.modelo,
                    manufacturer: e.fabricante,
                    power_w: e.consumo_w,
                    hashrate_th: e.hashrate_th,
                    unit_cost: e.custo_aproximado,
                })
                .collect();
            catalog.equipment.insert(category, items);
        }
        catalog.panels = self
            .paineis_solares
            .into_iter()
            .map(|p| CatalogPanel {
                model: p.modelo,
                kind: p.tipo,
                rated_power_w: p.potencia_w,
                efficiency: p.eficiencia,
                width_m: p.largura_m,
                height_m: p.altura_m,
                cost_per_watt: p.custo_por_watt,
                unit_price: p.preco,
            })
            .collect();
        validate_catalog(&catalog).map_err(|e| OracleError::InvalidField {
            field: "catalog".into(),
            reason: e.to_string(),
        })?;
        Ok(catalog)
    }
}
