/*!

# Quick start

This example shows how to run the pipeline end to end for a federal voting
date, from the published open data to the final per-commune results table.

**Finding the results URL** Each voting day, the Federal Statistical Office
publishes a real-time JSON file with the results of all federal ballots, one
entry per commune. Locate the dataset for your voting date on
[opendata.swiss](https://opendata.swiss/) (search for "Echtzeitdaten am
Abstimmungstag") and copy the JSON resource URL.

**Writing the run configuration** The pipeline is driven by a JSON file:

```text
{
  "votingDate": "2024-11-24",
  "resultsUrl": "https://ogd-static.voteinfo-app.ch/v1/ogd/sd-t-17-02-20241124-eidgAbstimmung.json",
  "lineSources": [
    { "name": "ic_1", "filePath": "input/processed/InterCity_1_communes.csv", "orderColumn": "order_ic1" },
    { "name": "ic_21", "filePath": "input/processed/InterCity_21_communes.csv", "orderColumn": "order_ic21" }
  ],
  "cantonFile": "input/processed/canton_iso2.csv",
  "translationFile": "input/processed/translations.csv"
}
```

The line files list the communes along each railway line with their position
(`orderColumn`) and their geocode (`GMDNR` by default). The geocodes may be
historical: the pipeline resolves them against the federal mutation registry
before joining the results.

**Running** From the repository root:

```bash
roestigraben --config votation.json
```

Three files are written to the output directory (`output` by default):

- `harmonized_<date>.csv`: the line communes with canonical geocodes,
  canton abbreviations and FR/DE display names;
- `ballot_name_<date>.csv`: one row per ballot and language with the long
  title and an empty `title_short` column. Fill in the short titles by hand
  before the downstream reporting step;
- `profil_results_<date>.csv`: the per-commune results for every ballot,
  keyed by canonical geocode.

Pass `--verbose` to see each mutation-chain resolution and the communes that
were merged or are missing from the results.

**Using the library directly** The resolution logic is available without the
pipeline through [`resolve_geocode`](crate::resolve_geocode),
[`run_harmonization`](crate::run_harmonization) and the
[`Builder`](crate::builder::Builder) API.

*/
